use uuid::Uuid;

use crate::auth::Principal;
use crate::error::AppError;
use crate::models::directory::{Directory, DirectoryContents, RootContents};
use crate::services::{guard, ranker};
use crate::state::AppState;

/// Ids arrive as text in request bodies. One that is not a UUID cannot
/// resolve to a directory.
pub fn parse_directory_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::NotFound(format!("Directory {} not found", raw)))
}

pub async fn get_contents(
    state: &AppState,
    principal: &Principal,
    directory_id: Uuid,
) -> Result<DirectoryContents, AppError> {
    let directory = state.tree.get_directory(directory_id)?;
    guard::authorize(principal, &directory)?;

    let (directories, files) = state.tree.list_children(directory_id)?;
    Ok(DirectoryContents {
        name: directory.name,
        files,
        directories,
    })
}

/// Contents read followed by a best-effort access bump. The bump is
/// attempted only once the read has succeeded and cannot fail it.
pub async fn open_directory(
    state: &AppState,
    principal: &Principal,
    directory_id: Uuid,
) -> Result<DirectoryContents, AppError> {
    let contents = get_contents(state, principal, directory_id).await?;
    ranker::record_access_best_effort(state, directory_id).await;
    Ok(contents)
}

pub async fn get_root_contents(
    state: &AppState,
    principal: &Principal,
) -> Result<RootContents, AppError> {
    let root = state.tree.get_or_create_root(principal.id())?;
    let contents = get_contents(state, principal, root.id).await?;
    Ok(RootContents {
        rootdir: root.id,
        contents,
    })
}

pub async fn create_subdirectory(
    state: &AppState,
    principal: &Principal,
    parent_id: Uuid,
    name: &str,
) -> Result<Directory, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Directory name cannot be empty".into()));
    }

    let parent = state.tree.get_directory(parent_id)?;
    guard::authorize(principal, &parent)?;

    let directory = state.tree.insert_directory(parent_id, name, principal.id())?;
    Ok(directory)
}

/// Unauthenticated on purpose: any caller may bump any directory.
pub async fn record_access(state: &AppState, directory_id: Uuid) -> Result<u64, AppError> {
    ranker::record_access(state, directory_id).await
}

/// Global across all owners.
pub async fn get_most_accessed(state: &AppState) -> Option<Directory> {
    ranker::most_accessed(state).await
}
