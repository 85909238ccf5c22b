use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::AppError;
use crate::integrations::blob_store::blob_path;
use crate::models::file::RegisterFileRequest;
use crate::services::file_service;
use crate::state::AppState;

use super::extract::{ApiJson, ApiPath};

pub async fn upload_file(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath((directory_id, filename)): ApiPath<(Uuid, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let file =
        file_service::upload_file(&state, &principal, directory_id, &filename, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": file, "error": null })),
    ))
}

pub async fn register_file(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(req): ApiJson<RegisterFileRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let file = file_service::register_file(&state, &principal, req).await?;
    tracing::info!(
        directory_id = %file.directory_id,
        file_id = %file.id,
        "File registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": file, "error": null })),
    ))
}

pub async fn download_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let path = blob_path(&state.config.blobs_dir(), &key)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid blob key: {}", key)))?;

    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("Blob {} not found", key)));
        }
        Err(e) => return Err(e.into()),
    };
    let size = file.metadata().await?.len();
    let content_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    let response = axum::response::Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", size.to_string())
        .header("ETag", format!("\"{}\"", key))
        .header("Cache-Control", "public, max-age=31536000, immutable")
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
