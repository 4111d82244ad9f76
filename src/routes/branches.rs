//! Branch listing and branch pointer mutations.
//!
//! - GET /api/branches
//!   Local branches with the current one flagged. Cached per repository.
//!
//! - POST /api/branch/checkout { branch }
//! - POST /api/branch/create { name, startPoint? }
//! - POST /api/branch/delete { name, force? }
//! - POST /api/branch/rename { oldName, newName }
//! - POST /api/branch/merge { branch, noFf? }
//! - POST /api/branch/reset { target, mode? }  (soft | mixed | hard)
//! - POST /api/branch/rebase { target }  (never interactive)
//!
//! Every mutation invalidates the branch cache once git has succeeded.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedRepo;
use crate::git::refs::ResetMode;
use crate::models::Branch;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/branches", get(list_branches))
        .route("/api/branch/checkout", post(checkout_branch))
        .route("/api/branch/create", post(create_branch))
        .route("/api/branch/delete", post(delete_branch))
        .route("/api/branch/rename", post(rename_branch))
        .route("/api/branch/merge", post(merge_branch))
        .route("/api/branch/reset", post(reset_branch))
        .route("/api/branch/rebase", post(rebase_branch))
        .with_state(repo)
}

async fn list_branches(State(slot): State<SharedRepo>) -> Json<Vec<Branch>> {
    match slot.current() {
        Some(repo) => Json(repo.list_branches().await),
        None => Json(Vec::new()),
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutRequest {
    branch: String,
}

async fn checkout_branch(
    State(slot): State<SharedRepo>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<()>> {
    slot.require()?.checkout_branch(&request.branch).await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBranchRequest {
    name: String,
    start_point: Option<String>,
}

async fn create_branch(
    State(slot): State<SharedRepo>,
    Json(request): Json<CreateBranchRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .create_branch(&request.name, request.start_point.as_deref())
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
struct DeleteBranchRequest {
    name: String,
    #[serde(default)]
    force: bool,
}

async fn delete_branch(
    State(slot): State<SharedRepo>,
    Json(request): Json<DeleteBranchRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .delete_branch(&request.name, request.force)
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameBranchRequest {
    old_name: String,
    new_name: String,
}

async fn rename_branch(
    State(slot): State<SharedRepo>,
    Json(request): Json<RenameBranchRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .rename_branch(&request.old_name, &request.new_name)
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeRequest {
    branch: String,
    #[serde(default)]
    no_ff: bool,
}

async fn merge_branch(
    State(slot): State<SharedRepo>,
    Json(request): Json<MergeRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .merge_branch(&request.branch, request.no_ff)
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    target: String,
    #[serde(default)]
    mode: String,
}

async fn reset_branch(
    State(slot): State<SharedRepo>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .reset(&request.target, ResetMode::parse(&request.mode))
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
struct RebaseRequest {
    target: String,
}

async fn rebase_branch(
    State(slot): State<SharedRepo>,
    Json(request): Json<RebaseRequest>,
) -> Result<Json<()>> {
    slot.require()?.rebase(&request.target).await?;
    Ok(Json(()))
}
