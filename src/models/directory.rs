use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::file::FileRecord;

pub const ROOT_DIRECTORY_NAME: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    pub id: Uuid,
    pub name: String,
    pub owner_id: String,
    /// `None` only for an owner's root directory.
    pub parent_id: Option<Uuid>,
    pub access_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Directory {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryContents {
    pub name: String,
    pub files: Vec<FileRecord>,
    pub directories: Vec<Directory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDirectoryRequest {
    /// Kept raw so an unparseable id reports as not found.
    pub parent_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAccessRequest {
    pub directory_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetContentsQuery {
    pub track: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootContents {
    pub rootdir: Uuid,
    #[serde(flatten)]
    pub contents: DirectoryContents,
}
