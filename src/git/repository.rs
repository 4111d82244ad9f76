use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::git::cache::{Category, MetadataCache};
use crate::git::runner::{CommandRunner, GitCli};
use crate::models::RepositoryInfo;

/// One repository on disk plus everything scoped to it: the runner rooted at
/// its work tree, its own metadata cache and the current stash generation.
pub struct GitRepository {
    path: PathBuf,
    runner: Arc<dyn CommandRunner>,
    cache: MetadataCache,
    settings: Settings,
    stash_generation: AtomicU64,
}

impl GitRepository {
    /// Opens the work tree containing `path`, verified with `git rev-parse`.
    pub async fn open<P: AsRef<Path>>(path: P, settings: Settings) -> Result<Self> {
        let path = path.as_ref();
        let probe = GitCli::new(path);
        let toplevel = probe
            .run_with_timeout(settings.metadata_timeout, &["rev-parse", "--show-toplevel"])
            .await
            .map_err(|e| {
                tracing::debug!(path = %path.display(), error = %e, "not a git work tree");
                AppError::RepoNotFound(path.display().to_string())
            })?;

        let root = PathBuf::from(toplevel.trim());
        tracing::info!(path = %root.display(), "opened repository");
        Ok(Self::with_runner(root.clone(), Arc::new(GitCli::new(root)), settings))
    }

    pub fn with_runner(
        path: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
        settings: Settings,
    ) -> Self {
        Self {
            path: path.into(),
            runner,
            cache: MetadataCache::new(settings.cache_ttl),
            settings,
            stash_generation: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn info(&self) -> RepositoryInfo {
        RepositoryInfo {
            name: self.name(),
            path: self.path.to_string_lossy().to_string(),
            current: true,
        }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) async fn git(&self, args: &[&str]) -> Result<String> {
        self.runner.run(args).await
    }

    pub(crate) async fn git_with_timeout(&self, timeout: Duration, args: &[&str]) -> Result<String> {
        self.runner.run_with_timeout(timeout, args).await
    }

    /// Runs a mutating command, invalidating `categories` only if it succeeded.
    pub(crate) async fn mutate(&self, args: &[&str], categories: &[Category]) -> Result<String> {
        let output = self.git(args).await?;
        for category in categories {
            self.cache.invalidate(*category);
        }
        Ok(output)
    }

    pub fn stash_generation(&self) -> u64 {
        self.stash_generation.load(Ordering::SeqCst)
    }

    /// Marks every previously issued stash index as stale.
    pub(crate) fn bump_stash_generation(&self) -> u64 {
        self.stash_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Resolves a repository-relative path inside the work tree.
    pub(crate) fn worktree_path(&self, relative: &str) -> Result<PathBuf> {
        check_relative_path(relative)?;
        Ok(self.path.join(relative))
    }
}

/// Rejects names git would parse as an option, and empty names.
pub(crate) fn check_ref_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{kind} name cannot be empty")));
    }
    if name.starts_with('-') {
        return Err(AppError::InvalidInput(format!("invalid {kind} name: {name}")));
    }
    Ok(())
}

pub(crate) fn check_relative_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(AppError::InvalidInput("file path cannot be empty".to_string()));
    }
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(AppError::InvalidInput(format!("invalid path: {path}")));
    }
    Ok(())
}

/// The repository currently being served, if any.
///
/// Switching replaces the whole handle (and with it the cache); requests
/// holding the previous `Arc` finish against the old repository.
pub struct RepoSlot {
    current: RwLock<Option<Arc<GitRepository>>>,
    settings: Settings,
}

impl RepoSlot {
    pub fn new(repo: Option<GitRepository>, settings: Settings) -> Self {
        Self {
            current: RwLock::new(repo.map(Arc::new)),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current(&self) -> Option<Arc<GitRepository>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn require(&self) -> Result<Arc<GitRepository>> {
        self.current().ok_or(AppError::NoRepository)
    }

    pub fn replace(&self, repo: GitRepository) -> Arc<GitRepository> {
        let repo = Arc::new(repo);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(repo.clone());
        tracing::info!(path = %repo.path().display(), "switched repository");
        repo
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!("cleared repository selection");
    }
}

pub type SharedRepo = Arc<RepoSlot>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::runner::ScriptedRunner;

    #[tokio::test]
    async fn failed_mutation_leaves_cache_alone() {
        let runner = Arc::new(ScriptedRunner::new().fail("checkout nope", "error: pathspec"));
        let repo = GitRepository::with_runner("/repo", runner, Settings::default());
        repo.cache().store(&[crate::models::Branch {
            name: "main".into(),
            hash: "abc".into(),
            is_remote: false,
            is_current: true,
            upstream: None,
        }], 0);

        assert!(repo.mutate(&["checkout", "nope"], &[Category::Branches]).await.is_err());
        assert!(repo.cache().is_fresh(Category::Branches));
    }

    #[test]
    fn ref_names_cannot_look_like_options() {
        assert!(check_ref_name("branch", "feature/x").is_ok());
        assert!(check_ref_name("branch", "--force").is_err());
        assert!(check_ref_name("branch", "  ").is_err());
    }

    #[test]
    fn relative_paths_stay_inside_worktree() {
        assert!(check_relative_path("src/main.rs").is_ok());
        assert!(check_relative_path("../secret").is_err());
        assert!(check_relative_path("/etc/passwd").is_err());
        assert!(check_relative_path("").is_err());
    }

    #[test]
    fn slot_starts_empty_and_switches() {
        let slot = RepoSlot::new(None, Settings::default());
        assert!(matches!(slot.require(), Err(AppError::NoRepository)));

        let runner = Arc::new(ScriptedRunner::new());
        slot.replace(GitRepository::with_runner("/tmp/project", runner, Settings::default()));
        assert_eq!(slot.require().unwrap().name(), "project");

        slot.clear();
        assert!(slot.current().is_none());
    }
}
