use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitStats {
    pub files_changed: usize,
    pub additions: usize,
    pub deletions: usize,
}

impl CommitStats {
    pub fn from_changes(changes: &[FileChange]) -> Self {
        Self {
            files_changed: changes.len(),
            additions: changes.iter().map(|c| c.additions).sum(),
            deletions: changes.iter().map(|c| c.deletions).sum(),
        }
    }
}

/// A single commit as parsed from `git log`.
///
/// `parents` holds hashes only; there is no in-memory graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub hash: String,
    pub short_hash: String,
    pub message: String,
    pub author: Author,
    pub committer: Author,
    pub date: DateTime<Utc>,
    pub commit_date: DateTime<Utc>,
    pub parents: Vec<String>,
    pub refs: Vec<String>,
    pub stats: CommitStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_changes: Option<Vec<FileChange>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub path: String,
    /// Native git status letter (`A`, `M`, `D`, `R100`, ...) for commits;
    /// `staged-*`, `unstaged-*` or `untracked` for working tree changes
    pub status: String,
    pub additions: usize,
    pub deletions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
}
