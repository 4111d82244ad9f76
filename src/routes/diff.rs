//! File diff and content endpoints.
//!
//! - GET /api/diff?revision=&path=
//!   One file's hunks plus both full sides. `revision=uncommitted` diffs the
//!   working tree against HEAD (untracked files show as all additions).
//! - GET /api/file-content?revision=&path=
//!   File lines at a revision, or from the working tree for `uncommitted`.
//! - POST /api/file-content { path, lines }
//!   Overwrites a working-tree file.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedRepo;
use crate::models::FileDiff;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/diff", get(get_diff))
        .route("/api/file-content", get(get_file_content).post(save_file_content))
        .with_state(repo)
}

#[derive(Debug, Deserialize)]
struct FileQuery {
    revision: String,
    path: String,
}

async fn get_diff(
    State(slot): State<SharedRepo>,
    Query(query): Query<FileQuery>,
) -> Result<Json<FileDiff>> {
    let diff = slot
        .require()?
        .file_diff(&query.revision, &query.path)
        .await?;
    Ok(Json(diff))
}

async fn get_file_content(
    State(slot): State<SharedRepo>,
    Query(query): Query<FileQuery>,
) -> Result<Json<Vec<String>>> {
    let lines = slot
        .require()?
        .file_content(&query.revision, &query.path)
        .await?;
    Ok(Json(lines))
}

#[derive(Debug, Deserialize)]
struct SaveFileRequest {
    path: String,
    lines: Vec<String>,
}

async fn save_file_content(
    State(slot): State<SharedRepo>,
    Json(request): Json<SaveFileRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .save_file_content(&request.path, &request.lines)
        .await?;
    Ok(Json(()))
}
