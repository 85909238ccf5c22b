use crate::models::snapshot::{MetadataSnapshot, SNAPSHOT_VERSION};
use std::path::Path;

pub fn save_snapshot(path: &Path, snapshot: &MetadataSnapshot) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("bin.tmp");
    let data = bincode::serialize(snapshot)?;
    std::fs::write(&tmp_path, &data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn load_snapshot(path: &Path) -> anyhow::Result<Option<MetadataSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read(path)?;
    let snapshot = match bincode::deserialize::<MetadataSnapshot>(&data) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Snapshot unreadable, starting from the WAL alone");
            return Ok(None);
        }
    };
    if snapshot.version != SNAPSHOT_VERSION {
        tracing::warn!(
            expected = SNAPSHOT_VERSION,
            found = snapshot.version,
            path = %path.display(),
            "Ignoring snapshot with unsupported version"
        );
        return Ok(None);
    }
    Ok(Some(snapshot))
}
