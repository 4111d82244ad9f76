//! GET /api/all?limit=
//!
//! First page of commits plus branches, tags, stashes, remotes and
//! uncommitted changes in one response, fetched concurrently. Empty (not an
//! error) when no repository is selected.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedRepo;
use crate::git::snapshot::load_snapshot;
use crate::models::RepositorySnapshot;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/all", get(get_all_data))
        .with_state(repo)
}

#[derive(Debug, Deserialize)]
struct SnapshotQuery {
    limit: Option<usize>,
}

async fn get_all_data(
    State(slot): State<SharedRepo>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<RepositorySnapshot>> {
    let limit = query.limit.unwrap_or(slot.settings().default_limit);
    let snapshot = load_snapshot(slot.current(), limit).await?;
    Ok(Json(snapshot))
}
