//! Git data access: every read and write goes through the `git` binary via a
//! [`runner::CommandRunner`], one [`GitRepository`] handle per work tree.
//!
//! - `runner`: process execution with timeouts (and a scripted fake for tests)
//! - `cache`: per-repository TTL cache for branches, tags and remotes
//! - `history`: commit log, decorations, commit details
//! - `refs`: branches, tags, remotes and their mutations
//! - `stash`: stash listing and mutations with stale-index detection
//! - `diff`: hunk parsing, file contents, file change summaries
//! - `worktree`: stage, unstage, discard, commit
//! - `snapshot`: concurrent fetch of every category for the dashboard
//! - `discovery`: finding repositories under a directory

pub mod cache;
pub mod diff;
pub mod discovery;
pub mod history;
pub mod refs;
pub mod repository;
pub mod runner;
pub mod snapshot;
pub mod stash;
pub mod worktree;

pub use repository::{GitRepository, RepoSlot, SharedRepo};
