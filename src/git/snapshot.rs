//! The dashboard snapshot: every data category fetched concurrently.
//!
//! Each category runs as its own task and reports on a shared channel; the
//! collector stops at the first error and aborts whatever is still running.
//! Categories are not captured at one logical instant, only within the cache
//! TTL window.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::git::GitRepository;
use crate::models::{Branch, Commit, FileChange, Remote, RepositorySnapshot, Stash, Tag};

const PARTS: usize = 6;

#[derive(Debug)]
pub(crate) enum Part {
    Commits(Vec<Commit>),
    Branches(Vec<Branch>),
    Tags(Vec<Tag>),
    Stashes(Vec<Stash>),
    Remotes(Vec<Remote>),
    Uncommitted(Vec<FileChange>),
}

fn spawn_part<F>(tx: &mpsc::Sender<Result<Part>>, fetch: F) -> JoinHandle<()>
where
    F: Future<Output = Result<Part>> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        // The collector is gone once it has failed; nothing left to report to
        let _ = tx.send(fetch.await).await;
    })
}

/// Collects `expected` parts, failing on the first error or on a task that
/// ended without reporting.
pub(crate) async fn gather(
    mut rx: mpsc::Receiver<Result<Part>>,
    expected: usize,
) -> Result<RepositorySnapshot> {
    let mut snapshot = RepositorySnapshot::default();
    for _ in 0..expected {
        let part = rx
            .recv()
            .await
            .ok_or_else(|| AppError::Internal("snapshot task ended without a result".to_string()))??;

        match part {
            Part::Commits(commits) => snapshot.commits = commits,
            Part::Branches(branches) => snapshot.branches = branches,
            Part::Tags(tags) => snapshot.tags = tags,
            Part::Stashes(stashes) => snapshot.stashes = stashes,
            Part::Remotes(remotes) => snapshot.remotes = remotes,
            Part::Uncommitted(changes) => snapshot.uncommitted_changes = changes,
        }
    }
    Ok(snapshot)
}

/// First page of history plus all metadata for `repo`; empty when no
/// repository is selected.
pub async fn load_snapshot(
    repo: Option<Arc<GitRepository>>,
    limit: usize,
) -> Result<RepositorySnapshot> {
    let Some(repo) = repo else {
        return Ok(RepositorySnapshot::default());
    };

    let (tx, rx) = mpsc::channel(PARTS);
    let handles = vec![
        spawn_part(&tx, {
            let repo = repo.clone();
            async move { Ok(Part::Commits(repo.list_commits(limit, 0, "", false).await)) }
        }),
        spawn_part(&tx, {
            let repo = repo.clone();
            async move { Ok(Part::Branches(repo.list_branches().await)) }
        }),
        spawn_part(&tx, {
            let repo = repo.clone();
            async move { Ok(Part::Tags(repo.list_tags().await)) }
        }),
        spawn_part(&tx, {
            let repo = repo.clone();
            async move { Ok(Part::Stashes(repo.list_stashes().await)) }
        }),
        spawn_part(&tx, {
            let repo = repo.clone();
            async move { Ok(Part::Remotes(repo.list_remotes().await)) }
        }),
        spawn_part(&tx, {
            let repo = repo.clone();
            async move { Ok(Part::Uncommitted(repo.uncommitted_changes().await)) }
        }),
    ];
    drop(tx);

    let gathered = gather(rx, handles.len()).await;
    for handle in &handles {
        handle.abort();
    }

    let mut snapshot = gathered.inspect_err(|e| {
        tracing::warn!(error = %e, "snapshot aborted");
    })?;
    snapshot.has_more = limit > 0 && snapshot.commits.len() == limit;
    snapshot.offset = snapshot.commits.len();
    Ok(snapshot)
}
