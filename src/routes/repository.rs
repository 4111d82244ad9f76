//! Repository selection.
//!
//! - GET /api/repository
//!   The repository being served, or null when none is selected.
//!
//! - GET /api/repositories
//!   Repositories found under the scan root (or next to the current
//!   repository), with the current one flagged.
//!
//! - POST /api/repository/switch { path: string }
//!   Serves a different repository. The new handle starts with a fresh cache.
//!
//! - POST /api/repository/clear
//!   Drops the selection; reads return empty data until the next switch.

use std::path::PathBuf;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::git::discovery::discover_repositories;
use crate::git::{GitRepository, SharedRepo};
use crate::models::{RepositoryInfo, SwitchRepoRequest};

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/repository", get(get_repository_info))
        .route("/api/repositories", get(list_repositories))
        .route("/api/repository/switch", post(switch_repository))
        .route("/api/repository/clear", post(clear_repository))
        .with_state(repo)
}

async fn get_repository_info(State(slot): State<SharedRepo>) -> Json<Option<RepositoryInfo>> {
    Json(slot.current().map(|repo| repo.info()))
}

async fn list_repositories(State(slot): State<SharedRepo>) -> Result<Json<Vec<RepositoryInfo>>> {
    let current = slot.current().map(|repo| repo.path().to_path_buf());
    let root: Option<PathBuf> = slot
        .settings()
        .scan_root
        .clone()
        .or_else(|| current.as_ref().and_then(|p| p.parent()).map(|p| p.to_path_buf()));

    let Some(root) = root else {
        return Ok(Json(Vec::new()));
    };
    let repos = discover_repositories(root, slot.settings().scan_depth, current).await?;
    Ok(Json(repos))
}

async fn switch_repository(
    State(slot): State<SharedRepo>,
    Json(request): Json<SwitchRepoRequest>,
) -> Result<Json<RepositoryInfo>> {
    let repo = GitRepository::open(&request.path, slot.settings().clone()).await?;
    let repo = slot.replace(repo);
    Ok(Json(repo.info()))
}

async fn clear_repository(State(slot): State<SharedRepo>) -> Json<()> {
    slot.clear();
    Json(())
}
