//! Tree Store
//!
//! In-memory directory/file tree backed by a write-ahead log. Every mutation
//! is journaled before it becomes visible, and each one runs to completion
//! without an await point, so a dropped request can never leave a partially
//! inserted node behind.
//!
//! Lock order: `wal` -> `ranking` -> map shards.

pub mod ranking;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::models::directory::{Directory, ROOT_DIRECTORY_NAME};
use crate::models::file::FileRecord;
use crate::models::snapshot::{MetadataSnapshot, SNAPSHOT_VERSION};
use crate::persistence::snapshot::save_snapshot;
use crate::persistence::wal::{WalEntry, WalRecord, WalWriter};
use ranking::AccessIndex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("directory {0} not found")]
    DirectoryNotFound(Uuid),

    #[error("owner {owner_id} does not own parent directory {parent_id}")]
    OwnershipMismatch { parent_id: Uuid, owner_id: String },

    #[error("journal write failed: {0}")]
    Journal(anyhow::Error),
}

pub struct TreeStore {
    directories: DashMap<Uuid, Directory>,
    children: DashMap<Uuid, Vec<Uuid>>,
    files: DashMap<Uuid, FileRecord>,
    directory_files: DashMap<Uuid, Vec<Uuid>>,
    roots: DashMap<String, Uuid>,
    ranking: Mutex<AccessIndex>,
    wal: Mutex<WalWriter>,
    /// WAL sequence the restored snapshot already covers.
    restored_seq: AtomicU64,
}

impl TreeStore {
    pub fn new(wal: WalWriter) -> Self {
        Self {
            directories: DashMap::new(),
            children: DashMap::new(),
            files: DashMap::new(),
            directory_files: DashMap::new(),
            roots: DashMap::new(),
            ranking: Mutex::new(AccessIndex::new()),
            wal: Mutex::new(wal),
            restored_seq: AtomicU64::new(0),
        }
    }

    pub fn get_directory(&self, id: Uuid) -> Result<Directory, StoreError> {
        self.directories
            .get(&id)
            .map(|d| d.value().clone())
            .ok_or(StoreError::DirectoryNotFound(id))
    }

    pub fn root_of(&self, owner_id: &str) -> Option<Directory> {
        let root_id = self.roots.get(owner_id).map(|r| *r.value())?;
        self.directories.get(&root_id).map(|d| d.value().clone())
    }

    pub fn get_or_create_root(&self, owner_id: &str) -> Result<Directory, StoreError> {
        if let Some(root) = self.root_of(owner_id) {
            return Ok(root);
        }

        let mut wal = self.wal.lock();
        // Another request may have provisioned it while we waited.
        if let Some(root) = self.root_of(owner_id) {
            return Ok(root);
        }

        let root = Directory {
            id: Uuid::new_v4(),
            name: ROOT_DIRECTORY_NAME.to_string(),
            owner_id: owner_id.to_string(),
            parent_id: None,
            access_count: 0,
            created_at: Utc::now(),
        };
        wal.append(&WalEntry::DirectoryCreated {
            directory: root.clone(),
        })
        .map_err(StoreError::Journal)?;
        self.attach_directory(root.clone());

        tracing::info!(owner_id = %owner_id, directory_id = %root.id, "Root directory provisioned");
        Ok(root)
    }

    /// Creates a directory under `parent_id`. Ownership is inherited from the
    /// parent, so `owner_id` must match it.
    pub fn insert_directory(
        &self,
        parent_id: Uuid,
        name: &str,
        owner_id: &str,
    ) -> Result<Directory, StoreError> {
        let mut wal = self.wal.lock();

        let parent = self.get_directory(parent_id)?;
        if parent.owner_id != owner_id {
            return Err(StoreError::OwnershipMismatch {
                parent_id,
                owner_id: owner_id.to_string(),
            });
        }

        let directory = Directory {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_id: parent.owner_id,
            parent_id: Some(parent_id),
            access_count: 0,
            created_at: Utc::now(),
        };
        wal.append(&WalEntry::DirectoryCreated {
            directory: directory.clone(),
        })
        .map_err(StoreError::Journal)?;
        self.attach_directory(directory.clone());

        Ok(directory)
    }

    pub fn register_file(
        &self,
        directory_id: Uuid,
        name: &str,
        extension: &str,
        file_url: &str,
    ) -> Result<FileRecord, StoreError> {
        let mut wal = self.wal.lock();

        if !self.directories.contains_key(&directory_id) {
            return Err(StoreError::DirectoryNotFound(directory_id));
        }

        let file = FileRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            extension: extension.to_string(),
            file_url: file_url.to_string(),
            directory_id,
            created_at: Utc::now(),
        };
        wal.append(&WalEntry::FileRegistered { file: file.clone() })
            .map_err(StoreError::Journal)?;
        self.attach_file(file.clone());

        Ok(file)
    }

    /// Direct child directories and files of `id`, each in insertion order.
    pub fn list_children(
        &self,
        id: Uuid,
    ) -> Result<(Vec<Directory>, Vec<FileRecord>), StoreError> {
        if !self.directories.contains_key(&id) {
            return Err(StoreError::DirectoryNotFound(id));
        }

        let child_ids = self
            .children
            .get(&id)
            .map(|c| c.value().clone())
            .unwrap_or_default();
        let file_ids = self
            .directory_files
            .get(&id)
            .map(|f| f.value().clone())
            .unwrap_or_default();

        let directories = child_ids
            .iter()
            .filter_map(|cid| self.directories.get(cid).map(|d| d.value().clone()))
            .collect();
        let files = file_ids
            .iter()
            .filter_map(|fid| self.files.get(fid).map(|f| f.value().clone()))
            .collect();

        Ok((directories, files))
    }

    /// Increments the access counter by exactly one and returns the new value.
    pub fn record_access(&self, id: Uuid) -> Result<u64, StoreError> {
        let mut wal = self.wal.lock();

        if !self.directories.contains_key(&id) {
            return Err(StoreError::DirectoryNotFound(id));
        }
        wal.append(&WalEntry::AccessRecorded {
            directory_id: id,
            recorded_at: Utc::now(),
        })
        .map_err(StoreError::Journal)?;

        self.bump_access(id).ok_or(StoreError::DirectoryNotFound(id))
    }

    pub fn find_most_accessed(&self) -> Option<Directory> {
        let ranking = self.ranking.lock();
        let top = ranking.top()?;
        self.directories.get(&top).map(|d| d.value().clone())
    }

    /// Every file in the subtree rooted at `root_id`, parents before children.
    pub fn subtree_files(&self, root_id: Uuid) -> Vec<FileRecord> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([root_id]);
        while let Some(id) = queue.pop_front() {
            if let Ok((dirs, files)) = self.list_children(id) {
                out.extend(files);
                queue.extend(dirs.into_iter().map(|d| d.id));
            }
        }
        out
    }

    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn restore(&self, snapshot: MetadataSnapshot) {
        self.wal.lock().resume_after(snapshot.wal_seq);
        self.restored_seq.store(snapshot.wal_seq, Ordering::Release);
        for directory in snapshot.directories {
            self.attach_directory(directory);
        }
        for file in snapshot.files {
            self.attach_file(file);
        }
    }

    /// Applies a journaled mutation without journaling it again. Records the
    /// restored snapshot already contains are skipped, since access bumps are
    /// not idempotent.
    pub fn replay(&self, record: WalRecord) {
        if record.seq <= self.restored_seq.load(Ordering::Acquire) {
            tracing::debug!(seq = record.seq, "Skipping WAL record covered by snapshot");
            return;
        }
        match record.entry {
            WalEntry::DirectoryCreated { directory } => {
                if let Some(parent_id) = directory.parent_id {
                    if !self.directories.contains_key(&parent_id) {
                        tracing::warn!(
                            directory_id = %directory.id,
                            parent_id = %parent_id,
                            "Skipping replayed directory with missing parent"
                        );
                        return;
                    }
                }
                self.attach_directory(directory);
            }
            WalEntry::FileRegistered { file } => {
                if !self.directories.contains_key(&file.directory_id) {
                    tracing::warn!(
                        file_id = %file.id,
                        directory_id = %file.directory_id,
                        "Skipping replayed file with missing directory"
                    );
                    return;
                }
                self.attach_file(file);
            }
            WalEntry::AccessRecorded { directory_id, .. } => {
                if self.bump_access(directory_id).is_none() {
                    tracing::warn!(directory_id = %directory_id, "Skipping replayed access for unknown directory");
                }
            }
        }
    }

    pub fn snapshot(&self) -> MetadataSnapshot {
        let wal = self.wal.lock();
        self.snapshot_through(wal.last_seq())
    }

    /// Writes a snapshot and truncates the WAL. Writers are held off for the
    /// duration so nothing journaled in between is dropped by the truncation.
    /// A crash between the two steps is harmless: the snapshot records the
    /// last sequence it covers and replay skips those records.
    /// Returns how many journal entries the snapshot absorbed.
    pub fn checkpoint(&self, path: &Path) -> anyhow::Result<u64> {
        let mut wal = self.wal.lock();
        let snapshot = self.snapshot_through(wal.last_seq());
        save_snapshot(path, &snapshot)?;
        let absorbed = wal.entry_count();
        wal.truncate()?;
        Ok(absorbed)
    }

    /// Caller holds the `wal` lock so no mutation lands past `wal_seq`.
    fn snapshot_through(&self, wal_seq: u64) -> MetadataSnapshot {
        let order = self.ranking.lock().creation_order();

        let directories: Vec<Directory> = order
            .iter()
            .filter_map(|id| self.directories.get(id).map(|d| d.value().clone()))
            .collect();
        let files = order
            .iter()
            .filter_map(|id| self.directory_files.get(id).map(|f| f.value().clone()))
            .flatten()
            .filter_map(|fid| self.files.get(&fid).map(|f| f.value().clone()))
            .collect();

        MetadataSnapshot {
            version: SNAPSHOT_VERSION,
            timestamp: Utc::now(),
            wal_seq,
            directories,
            files,
        }
    }

    fn attach_directory(&self, directory: Directory) {
        let mut ranking = self.ranking.lock();
        if !ranking.insert(directory.id, directory.access_count) {
            return;
        }

        let id = directory.id;
        if directory.is_root() {
            self.roots.insert(directory.owner_id.clone(), id);
        } else if let Some(parent_id) = directory.parent_id {
            self.children.entry(parent_id).or_default().push(id);
        }
        self.directories.insert(id, directory);
    }

    fn attach_file(&self, file: FileRecord) {
        if self.files.contains_key(&file.id) {
            return;
        }
        self.directory_files
            .entry(file.directory_id)
            .or_default()
            .push(file.id);
        self.files.insert(file.id, file);
    }

    fn bump_access(&self, id: Uuid) -> Option<u64> {
        let mut ranking = self.ranking.lock();
        let mut directory = self.directories.get_mut(&id)?;
        directory.access_count = directory.access_count.saturating_add(1);
        let count = directory.access_count;
        ranking.set_count(id, count);
        Some(count)
    }
}
