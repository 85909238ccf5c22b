use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::Principal;
use crate::error::AppError;
use crate::services::insights_service;
use crate::state::AppState;

pub async fn get_insights(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    let report = insights_service::generate(&state, &principal).await?;
    Ok(Json(json!({ "data": report, "error": null })))
}
