use bytes::Bytes;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::AppError;
use crate::models::file::{FileRecord, RegisterFileRequest};
use crate::services::{directory_service, guard};
use crate::state::AppState;

/// Splits `report.final.pdf` into (`report.final`, `pdf`). Dotfiles and names
/// without a dot get an empty extension.
pub fn split_filename(filename: &str) -> (String, String) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < filename.len() => (
            filename[..idx].to_string(),
            filename[idx + 1..].to_string(),
        ),
        _ => (filename.to_string(), String::new()),
    }
}

pub async fn upload_file(
    state: &AppState,
    principal: &Principal,
    directory_id: Uuid,
    filename: &str,
    data: Bytes,
) -> Result<FileRecord, AppError> {
    let directory = state.tree.get_directory(directory_id)?;
    guard::authorize(principal, &directory)?;

    let filename = filename.trim();
    if filename.is_empty() || filename.contains('/') {
        return Err(AppError::BadRequest(format!("Invalid filename: {:?}", filename)));
    }
    let (name, extension) = split_filename(filename);
    let size = data.len();

    // Blob first: a failed upload must not leave a record pointing nowhere.
    let file_url = state
        .blobs
        .put(&extension, data)
        .await
        .map_err(|e| AppError::Internal(format!("Blob upload failed: {}", e)))?;

    let file = state
        .tree
        .register_file(directory_id, &name, &extension, &file_url)?;

    tracing::info!(
        directory_id = %directory_id,
        file_id = %file.id,
        size = size,
        "File uploaded"
    );
    Ok(file)
}

pub async fn register_file(
    state: &AppState,
    principal: &Principal,
    req: RegisterFileRequest,
) -> Result<FileRecord, AppError> {
    let directory_id = directory_service::parse_directory_id(&req.directory_id)?;
    let directory = state.tree.get_directory(directory_id)?;
    guard::authorize(principal, &directory)?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("File name cannot be empty".into()));
    }
    let file_url = req.file_url.trim();
    if file_url.is_empty() {
        return Err(AppError::BadRequest("File URL is required".into()));
    }

    let file = state.tree.register_file(
        directory_id,
        name,
        req.extension.trim().trim_start_matches('.'),
        file_url,
    )?;
    Ok(file)
}
