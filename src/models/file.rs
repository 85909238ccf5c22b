use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    /// Without the leading dot; empty when the filename has none.
    pub extension: String,
    pub file_url: String,
    pub directory_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// What the insights provider gets to see about a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    pub extension: String,
    pub created_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileMetadata {
    fn from(file: &FileRecord) -> Self {
        Self {
            name: file.name.clone(),
            extension: file.extension.clone(),
            created_at: file.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFileRequest {
    pub directory_id: String,
    pub name: String,
    #[serde(default)]
    pub extension: String,
    pub file_url: String,
}
