//! Tag endpoints.
//!
//! - GET /api/tags
//! - GET /api/tag/{tag}/details
//!   Kind, target, and for annotated tags the tagger and message.
//! - POST /api/tag/create { name, target?, message?, annotated? }
//! - POST /api/tag/push { remote, tag? }
//!   Pushes one tag, or every tag when `tag` is absent.
//! - DELETE /api/tag/{tag}

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedRepo;
use crate::models::Tag;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/tags", get(list_tags))
        .route("/api/tag/create", post(create_tag))
        .route("/api/tag/push", post(push_tag))
        .route("/api/tag/{tag}", delete(delete_tag))
        .route("/api/tag/{tag}/details", get(get_tag_details))
        .with_state(repo)
}

async fn list_tags(State(slot): State<SharedRepo>) -> Json<Vec<Tag>> {
    match slot.current() {
        Some(repo) => Json(repo.list_tags().await),
        None => Json(Vec::new()),
    }
}

async fn get_tag_details(
    State(slot): State<SharedRepo>,
    Path(tag): Path<String>,
) -> Result<Json<Tag>> {
    let tag = slot.require()?.tag_details(&tag).await?;
    Ok(Json(tag))
}

#[derive(Debug, Deserialize)]
struct CreateTagRequest {
    name: String,
    target: Option<String>,
    message: Option<String>,
    #[serde(default)]
    annotated: bool,
}

async fn create_tag(
    State(slot): State<SharedRepo>,
    Json(request): Json<CreateTagRequest>,
) -> Result<Json<()>> {
    slot.require()?
        .create_tag(
            &request.name,
            request.target.as_deref(),
            request.message.as_deref(),
            request.annotated,
        )
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
struct PushTagRequest {
    remote: String,
    tag: Option<String>,
}

async fn push_tag(
    State(slot): State<SharedRepo>,
    Json(request): Json<PushTagRequest>,
) -> Result<Json<()>> {
    let repo = slot.require()?;
    match request.tag.as_deref().filter(|t| !t.is_empty()) {
        Some(tag) => repo.push_tag(&request.remote, tag).await?,
        None => repo.push_all_tags(&request.remote).await?,
    }
    Ok(Json(()))
}

async fn delete_tag(State(slot): State<SharedRepo>, Path(tag): Path<String>) -> Result<Json<()>> {
    slot.require()?.delete_tag(&tag).await?;
    Ok(Json(()))
}
