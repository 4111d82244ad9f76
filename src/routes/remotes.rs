//! Remote endpoints.
//!
//! - GET /api/remotes
//! - GET /api/remote/{remote}/info
//! - POST /api/fetch { remote?, prune? }
//!   Fetches one remote (or all); refreshes remotes and branches afterwards.
//! - POST /api/pull { remote?, branch? }
//! - POST /api/push { remote?, branch?, force? }

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedRepo;
use crate::models::Remote;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/remotes", get(list_remotes))
        .route("/api/remote/{remote}/info", get(get_remote_info))
        .route("/api/fetch", post(fetch))
        .route("/api/pull", post(pull))
        .route("/api/push", post(push))
        .with_state(repo)
}

async fn list_remotes(State(slot): State<SharedRepo>) -> Json<Vec<Remote>> {
    match slot.current() {
        Some(repo) => Json(repo.list_remotes().await),
        None => Json(Vec::new()),
    }
}

async fn get_remote_info(
    State(slot): State<SharedRepo>,
    Path(remote): Path<String>,
) -> Result<Json<Remote>> {
    let remote = slot.require()?.remote_info(&remote).await?;
    Ok(Json(remote))
}

#[derive(Debug, Default, Deserialize)]
struct FetchRequest {
    remote: Option<String>,
    #[serde(default)]
    prune: bool,
}

async fn fetch(
    State(slot): State<SharedRepo>,
    Json(request): Json<FetchRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .fetch(request.remote.as_deref(), request.prune)
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Default, Deserialize)]
struct SyncRequest {
    remote: Option<String>,
    branch: Option<String>,
    #[serde(default)]
    force: bool,
}

async fn pull(
    State(slot): State<SharedRepo>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .pull(request.remote.as_deref(), request.branch.as_deref())
        .await?;
    Ok(Json(()))
}

async fn push(
    State(slot): State<SharedRepo>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .push(request.remote.as_deref(), request.branch.as_deref(), request.force)
        .await?;
    Ok(Json(()))
}
