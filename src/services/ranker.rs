use uuid::Uuid;

use crate::error::AppError;
use crate::models::directory::Directory;
use crate::state::AppState;

pub async fn record_access(state: &AppState, directory_id: Uuid) -> Result<u64, AppError> {
    let count = state.tree.record_access(directory_id)?;
    tracing::debug!(directory_id = %directory_id, access_count = count, "Access recorded");
    Ok(count)
}

/// Records an access on behalf of another operation. Failures are logged and
/// dropped so they never affect the operation they ride along with.
pub async fn record_access_best_effort(state: &AppState, directory_id: Uuid) {
    if let Err(e) = record_access(state, directory_id).await {
        tracing::warn!(
            directory_id = %directory_id,
            error = %e,
            "Failed to record directory access"
        );
    }
}

pub async fn most_accessed(state: &AppState) -> Option<Directory> {
    state.tree.find_most_accessed()
}
