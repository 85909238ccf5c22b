use crate::auth::Principal;
use crate::error::AppError;
use crate::models::directory::Directory;

/// Ownership check over an already-fetched directory. Never touches the
/// store: callers fetch first so a missing directory stays `NotFound`.
pub fn authorize(principal: &Principal, directory: &Directory) -> Result<(), AppError> {
    if directory.owner_id != principal.id() {
        tracing::warn!(
            principal = %principal.id(),
            directory_id = %directory.id,
            "Access denied"
        );
        return Err(AppError::access_denied());
    }
    Ok(())
}
