use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

use crate::models::directory::Directory;
use crate::models::file::FileRecord;

const WAL_FILE: &str = "current.wal";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum WalEntry {
    DirectoryCreated {
        directory: Directory,
    },
    FileRegistered {
        file: FileRecord,
    },
    AccessRecorded {
        directory_id: Uuid,
        recorded_at: DateTime<Utc>,
    },
}

/// A journaled entry with its position in the log. Sequence numbers keep
/// increasing across truncations, so a snapshot can name the last record it
/// already contains.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WalRecord {
    pub seq: u64,
    pub entry: WalEntry,
}

pub struct WalWriter {
    file: std::fs::File,
    entry_count: u64,
    last_seq: u64,
}

impl WalWriter {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let last_seq = Self::read_entries(dir)?
            .iter()
            .map(|r| r.seq)
            .max()
            .unwrap_or(0);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(WAL_FILE))?;
        Ok(Self {
            file,
            entry_count: 0,
            last_seq,
        })
    }

    /// Appends `entry` and returns the sequence number it was written under.
    pub fn append(&mut self, entry: &WalEntry) -> anyhow::Result<u64> {
        let seq = self.last_seq + 1;
        let data = bincode::serialize(&WalRecord {
            seq,
            entry: entry.clone(),
        })?;
        let len = data.len() as u32;
        // One write per record so a crash can only ever truncate the tail.
        let mut record = Vec::with_capacity(4 + data.len());
        record.extend_from_slice(&len.to_le_bytes());
        record.extend_from_slice(&data);
        self.file.write_all(&record)?;
        self.file.flush()?;
        self.last_seq = seq;
        self.entry_count += 1;
        Ok(seq)
    }

    pub fn truncate(&mut self) -> anyhow::Result<()> {
        // Append mode positions every write at the new end of file.
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.entry_count = 0;
        Ok(())
    }

    /// Entries appended since the last truncation.
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Never hand out a sequence number at or below `seq` again.
    pub fn resume_after(&mut self, seq: u64) {
        self.last_seq = self.last_seq.max(seq);
    }

    pub fn read_entries(dir: &Path) -> anyhow::Result<Vec<WalRecord>> {
        let wal_path = dir.join(WAL_FILE);
        if !wal_path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read(&wal_path)?;
        let mut entries = Vec::new();
        let mut cursor = 0;
        while cursor + 4 <= data.len() {
            let mut len_bytes = [0u8; 4];
            len_bytes.copy_from_slice(&data[cursor..cursor + 4]);
            let len = u32::from_le_bytes(len_bytes) as usize;
            cursor += 4;
            if cursor + len > data.len() {
                tracing::warn!(offset = cursor, "WAL truncated at entry boundary, stopping replay");
                break;
            }
            match bincode::deserialize::<WalRecord>(&data[cursor..cursor + len]) {
                Ok(record) => entries.push(record),
                Err(e) => {
                    tracing::warn!(offset = cursor, error = %e, "WAL entry corrupt, stopping replay");
                    break;
                }
            }
            cursor += len;
        }
        Ok(entries)
    }
}
