//! Commit history endpoints.
//!
//! - GET /api/commits?limit=&offset=&branch=&all=
//! - GET /api/commits/tag/{tag}?limit=&offset=
//! - GET /api/commit/{hash}
//!   One commit with refs, file changes and stats.
//! - POST /api/commit/create { message: string }
//!   Commits the index, responds with the new hash.
//! - POST /api/commit/cherry-pick { hash }
//! - POST /api/commit/revert { hash, noCommit? }

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::git::SharedRepo;
use crate::models::Commit;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/commits", get(get_commits))
        .route("/api/commits/tag/{tag}", get(get_commits_by_tag))
        .route("/api/commit/create", post(create_commit))
        .route("/api/commit/cherry-pick", post(cherry_pick_commit))
        .route("/api/commit/revert", post(revert_commit))
        .route("/api/commit/{hash}", get(get_commit_details))
        .with_state(repo)
}

#[derive(Debug, Deserialize)]
struct CommitsQuery {
    limit: Option<usize>,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    branch: String,
    #[serde(default)]
    all: bool,
}

async fn get_commits(
    State(slot): State<SharedRepo>,
    Query(query): Query<CommitsQuery>,
) -> Json<Vec<Commit>> {
    let Some(repo) = slot.current() else {
        return Json(Vec::new());
    };
    let limit = query.limit.unwrap_or(slot.settings().default_limit);
    Json(repo.list_commits(limit, query.offset, &query.branch, query.all).await)
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    limit: Option<usize>,
    #[serde(default)]
    offset: usize,
}

async fn get_commits_by_tag(
    State(slot): State<SharedRepo>,
    Path(tag): Path<String>,
    Query(query): Query<PageQuery>,
) -> Json<Vec<Commit>> {
    let Some(repo) = slot.current() else {
        return Json(Vec::new());
    };
    let limit = query.limit.unwrap_or(slot.settings().default_limit);
    Json(repo.list_commits_for_ref(&tag, limit, query.offset).await)
}

async fn get_commit_details(
    State(slot): State<SharedRepo>,
    Path(hash): Path<String>,
) -> Result<Json<Commit>> {
    let commit = slot.require()?.commit_details(&hash).await?;
    Ok(Json(commit))
}

#[derive(Debug, Deserialize)]
struct CreateCommitRequest {
    message: String,
}

async fn create_commit(
    State(slot): State<SharedRepo>,
    Json(request): Json<CreateCommitRequest>,
) -> Result<Json<Value>> {
    let hash = slot.require()?.create_commit(&request.message).await?;
    Ok(Json(json!({ "hash": hash })))
}

#[derive(Debug, Deserialize)]
struct CherryPickRequest {
    hash: String,
}

async fn cherry_pick_commit(
    State(slot): State<SharedRepo>,
    Json(request): Json<CherryPickRequest>,
) -> Result<Json<()>> {
    slot.require()?.cherry_pick(&request.hash).await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevertRequest {
    hash: String,
    #[serde(default)]
    no_commit: bool,
}

async fn revert_commit(
    State(slot): State<SharedRepo>,
    Json(request): Json<RevertRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .revert(&request.hash, request.no_commit)
        .await?;
    Ok(Json(()))
}
