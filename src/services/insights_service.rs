use serde::Serialize;

use crate::auth::Principal;
use crate::error::AppError;
use crate::models::file::FileMetadata;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct InsightsReport {
    pub metadata: Vec<FileMetadata>,
    pub insights: String,
}

/// Metadata for every file in the principal's tree, oldest first. A principal
/// without a root yet simply has no files.
pub fn collect_metadata(state: &AppState, principal: &Principal) -> Vec<FileMetadata> {
    let Some(root) = state.tree.root_of(principal.id()) else {
        return Vec::new();
    };
    let mut files = state.tree.subtree_files(root.id);
    files.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    files.iter().map(FileMetadata::from).collect()
}

pub async fn generate(state: &AppState, principal: &Principal) -> Result<InsightsReport, AppError> {
    let metadata = collect_metadata(state, principal);
    let insights = state.insights.analyze(&metadata).await.map_err(|e| {
        AppError::Internal(format!("Failed to generate insights: {}", e))
    })?;

    tracing::info!(
        principal = %principal.id(),
        files = metadata.len(),
        "Insights generated"
    );
    Ok(InsightsReport { metadata, insights })
}
