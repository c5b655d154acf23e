pub mod archive;
pub mod sqlite;

pub use archive::{read_snapshot, SnapshotArchive};
pub use sqlite::{RunRecord, SqliteStorage};
