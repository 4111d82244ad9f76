//! Stash endpoints.
//!
//! - GET /api/stashes
//!   Entries carry the stash `generation` they were listed under.
//! - GET /api/stash/{index}
//! - POST /api/stash/create { message?, includeUntracked? }
//! - POST /api/stash/apply | /pop | /drop { index, generation? }
//! - POST /api/stash/branch { branch, index, generation? }
//!
//! Passing `generation` makes a mutation fail with 400 if any stash change
//! happened since the listing, instead of acting on a shifted index.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedRepo;
use crate::models::{Commit, Stash};

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/stashes", get(list_stashes))
        .route("/api/stash/create", post(create_stash))
        .route("/api/stash/apply", post(apply_stash))
        .route("/api/stash/pop", post(pop_stash))
        .route("/api/stash/drop", post(drop_stash))
        .route("/api/stash/branch", post(branch_from_stash))
        .route("/api/stash/{index}", get(show_stash))
        .with_state(repo)
}

async fn list_stashes(State(slot): State<SharedRepo>) -> Json<Vec<Stash>> {
    match slot.current() {
        Some(repo) => Json(repo.list_stashes().await),
        None => Json(Vec::new()),
    }
}

async fn show_stash(
    State(slot): State<SharedRepo>,
    Path(index): Path<usize>,
) -> Result<Json<Commit>> {
    let commit = slot.require()?.show_stash(index).await?;
    Ok(Json(commit))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStashRequest {
    message: Option<String>,
    #[serde(default)]
    include_untracked: bool,
}

async fn create_stash(
    State(slot): State<SharedRepo>,
    Json(request): Json<CreateStashRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .push_stash(request.message.as_deref(), request.include_untracked)
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
struct StashRequest {
    index: usize,
    generation: Option<u64>,
}

async fn apply_stash(
    State(slot): State<SharedRepo>,
    Json(request): Json<StashRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .apply_stash(request.index, request.generation)
        .await?;
    Ok(Json(()))
}

async fn pop_stash(
    State(slot): State<SharedRepo>,
    Json(request): Json<StashRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .pop_stash(request.index, request.generation)
        .await?;
    Ok(Json(()))
}

async fn drop_stash(
    State(slot): State<SharedRepo>,
    Json(request): Json<StashRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .drop_stash(request.index, request.generation)
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
struct StashBranchRequest {
    branch: String,
    index: usize,
    generation: Option<u64>,
}

async fn branch_from_stash(
    State(slot): State<SharedRepo>,
    Json(request): Json<StashBranchRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .branch_from_stash(&request.branch, request.index, request.generation)
        .await?;
    Ok(Json(()))
}
