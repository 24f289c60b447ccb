pub mod classifier;
pub mod geometry;

pub use classifier::CourtGeometry;
pub use geometry::{Point, Polygon};
