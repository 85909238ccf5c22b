use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// External object store holding file bytes. The tree only ever sees the URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persists `data` and returns a URL the client can fetch it from.
    async fn put(&self, extension: &str, data: Bytes) -> anyhow::Result<String>;
}

/// Content-addressed blobs on local disk, served back under `/blobs/{key}`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_url: String,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf, public_url: &str) -> Self {
        Self {
            root,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, extension: &str, data: Bytes) -> anyhow::Result<String> {
        let digest = hex::encode(Sha256::digest(&data));
        let ext = sanitize_extension(extension);
        let key = if ext.is_empty() {
            digest
        } else {
            format!("{}.{}", digest, ext)
        };

        let path = self.root.join(&key);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&self.root)
                .await
                .with_context(|| format!("creating blob dir {}", self.root.display()))?;
            let tmp_path = self.root.join(format!("{}.{}.tmp", key, uuid::Uuid::new_v4()));
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&data).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, &path)
                .await
                .with_context(|| format!("committing blob {}", key))?;
        }

        Ok(format!("{}/blobs/{}", self.public_url, key))
    }
}

/// Resolves a blob key to its path under `root`, rejecting anything that is
/// not `<sha256 hex>[.<alphanumeric ext>]`.
pub fn blob_path(root: &Path, key: &str) -> Option<PathBuf> {
    let (digest, ext) = match key.split_once('.') {
        Some((d, e)) => (d, Some(e)),
        None => (key, None),
    };
    if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    if let Some(ext) = ext {
        if ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
    }
    Some(root.join(key))
}

fn sanitize_extension(extension: &str) -> String {
    extension
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}
