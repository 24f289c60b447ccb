pub mod archive_cache;
pub mod event_log;
pub mod match_session;

pub use archive_cache::{ArchiveCache, ArchivedMatch};
pub use match_session::MatchSession;
