//! API route handlers - maps HTTP endpoints to git operations.
//!
//! Each submodule defines routes for a feature area:
//! - `repository`: Current repository, discovery and switching
//! - `snapshot`: Everything for the dashboard in one request (GET /api/all)
//! - `commits`: Commit history, details, commit creation
//! - `branches`: Branch listing and mutations
//! - `tags`: Tag listing, details and mutations
//! - `remotes`: Remote listing, info, fetch
//! - `stashes`: Stash listing and mutations
//! - `diff`: File diffs and contents
//! - `worktree`: Uncommitted changes, stage/unstage/discard
//!
//! Listing endpoints answer with empty data when no repository is selected;
//! everything else responds 409.

pub mod branches;
pub mod commits;
pub mod diff;
pub mod remotes;
pub mod repository;
pub mod snapshot;
pub mod stashes;
pub mod tags;
pub mod worktree;

use axum::Router;

use crate::git::SharedRepo;

pub fn create_router(repo: SharedRepo) -> Router {
    Router::new()
        .merge(repository::routes(repo.clone()))
        .merge(snapshot::routes(repo.clone()))
        .merge(commits::routes(repo.clone()))
        .merge(branches::routes(repo.clone()))
        .merge(tags::routes(repo.clone()))
        .merge(remotes::routes(repo.clone()))
        .merge(stashes::routes(repo.clone()))
        .merge(diff::routes(repo.clone()))
        .merge(worktree::routes(repo))
}
