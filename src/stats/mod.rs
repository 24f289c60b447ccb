pub mod aggregator;
pub mod heatmap;

pub use aggregator::{compute_stats, MatchReport, StatsTarget, TeamStats};
pub use heatmap::{project, Heatmap};
