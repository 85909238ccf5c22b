use serde::{Deserialize, Serialize};

use super::directory::Directory;
use super::file::FileRecord;

pub const SNAPSHOT_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub version: u32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Last WAL sequence number already reflected here. Replay skips
    /// records at or below it.
    pub wal_seq: u64,
    /// In creation order.
    pub directories: Vec<Directory>,
    /// In registration order within each directory.
    pub files: Vec<FileRecord>,
}
