//! Working tree endpoints.
//!
//! - GET /api/uncommitted
//!   Staged, unstaged and untracked files (`staged-m`, `unstaged-d`,
//!   `untracked`, ...).
//! - POST /api/stage | /api/unstage | /api/discard { path }
//! - POST /api/clean { dryRun?, directories? }
//!   Removes untracked files; responds with git's report.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::git::SharedRepo;
use crate::models::FileChange;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/uncommitted", get(get_uncommitted_changes))
        .route("/api/stage", post(stage_file))
        .route("/api/unstage", post(unstage_file))
        .route("/api/discard", post(discard_file_changes))
        .route("/api/clean", post(clean_working_directory))
        .with_state(repo)
}

async fn get_uncommitted_changes(State(slot): State<SharedRepo>) -> Json<Vec<FileChange>> {
    match slot.current() {
        Some(repo) => Json(repo.uncommitted_changes().await),
        None => Json(Vec::new()),
    }
}

#[derive(Debug, Deserialize)]
struct PathRequest {
    path: String,
}

async fn stage_file(
    State(slot): State<SharedRepo>,
    Json(request): Json<PathRequest>,
) -> Result<Json<()>> {
    slot.require()?.stage_file(&request.path).await?;
    Ok(Json(()))
}

async fn unstage_file(
    State(slot): State<SharedRepo>,
    Json(request): Json<PathRequest>,
) -> Result<Json<()>> {
    slot.require()?.unstage_file(&request.path).await?;
    Ok(Json(()))
}

async fn discard_file_changes(
    State(slot): State<SharedRepo>,
    Json(request): Json<PathRequest>,
) -> Result<Json<()>> {
    slot.require()?.discard_file_changes(&request.path).await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CleanRequest {
    #[serde(default)]
    dry_run: bool,
    #[serde(default)]
    directories: bool,
}

async fn clean_working_directory(
    State(slot): State<SharedRepo>,
    Json(request): Json<CleanRequest>,
) -> Result<Json<Value>> {
    let output = slot
        .require()?
        .clean_working_directory(request.dry_run, request.directories)
        .await?;
    Ok(Json(json!({ "output": output })))
}
