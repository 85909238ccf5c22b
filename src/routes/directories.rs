use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::AppError;
use crate::models::directory::{CreateDirectoryRequest, GetContentsQuery, RecordAccessRequest};
use crate::services::directory_service;
use crate::state::AppState;

use super::extract::{ApiJson, ApiPath};

pub async fn get_root(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    let root = directory_service::get_root_contents(&state, &principal).await?;
    Ok(Json(json!({ "data": root, "error": null })))
}

pub async fn get_contents(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(directory_id): ApiPath<Uuid>,
    Query(query): Query<GetContentsQuery>,
) -> Result<Json<Value>, AppError> {
    let contents = if query.track.unwrap_or(false) {
        directory_service::open_directory(&state, &principal, directory_id).await?
    } else {
        directory_service::get_contents(&state, &principal, directory_id).await?
    };

    Ok(Json(json!({ "data": contents, "error": null })))
}

pub async fn create_directory(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(req): ApiJson<CreateDirectoryRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let parent_id = directory_service::parse_directory_id(&req.parent_id)?;
    let directory =
        directory_service::create_subdirectory(&state, &principal, parent_id, &req.name).await?;
    tracing::info!(
        directory_id = %directory.id,
        parent_id = %parent_id,
        owner_id = %directory.owner_id,
        "Directory created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": directory, "error": null })),
    ))
}

pub async fn record_access(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RecordAccessRequest>,
) -> Result<Json<Value>, AppError> {
    let directory_id = directory_service::parse_directory_id(&req.directory_id)?;
    let count = directory_service::record_access(&state, directory_id).await?;

    Ok(Json(json!({
        "data": { "accessCount": count },
        "error": null
    })))
}

pub async fn most_accessed(State(state): State<AppState>) -> Json<Value> {
    let directory = directory_service::get_most_accessed(&state).await;

    Json(json!({
        "data": { "directory": directory },
        "error": null
    }))
}
