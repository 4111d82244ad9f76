use serde::{Deserialize, Serialize};

use super::{Branch, Commit, FileChange, Remote, Stash, Tag};

/// Everything the dashboard needs for its first paint, fetched concurrently.
///
/// Categories are captured independently; they agree only to within the
/// cache TTL, not to a single instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    pub commits: Vec<Commit>,
    pub branches: Vec<Branch>,
    pub tags: Vec<Tag>,
    pub stashes: Vec<Stash>,
    pub remotes: Vec<Remote>,
    pub uncommitted_changes: Vec<FileChange>,
    pub has_more: bool,
    pub offset: usize,
}
