//! Working tree and index mutations.

use crate::error::{AppError, Result};
use crate::git::cache::Category;
use crate::git::repository::{GitRepository, check_relative_path};

impl GitRepository {
    pub async fn stage_file(&self, path: &str) -> Result<()> {
        check_relative_path(path)?;
        self.mutate(&["add", "--", path], &[]).await?;
        Ok(())
    }

    pub async fn unstage_file(&self, path: &str) -> Result<()> {
        check_relative_path(path)?;
        self.mutate(&["reset", "HEAD", "--", path], &[]).await?;
        Ok(())
    }

    /// Restores `path` to its HEAD content, dropping staged and unstaged edits.
    pub async fn discard_file_changes(&self, path: &str) -> Result<()> {
        check_relative_path(path)?;
        self.mutate(&["checkout", "HEAD", "--", path], &[]).await?;
        Ok(())
    }

    /// Commits the index and returns the new commit hash.
    pub async fn create_commit(&self, message: &str) -> Result<String> {
        if message.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "commit message cannot be empty".to_string(),
            ));
        }

        self.mutate(&["commit", "-m", message], &[Category::Branches])
            .await?;
        let hash = self.git(&["rev-parse", "HEAD"]).await?;
        Ok(hash.trim().to_string())
    }

    /// Removes untracked files (and directories with `directories`). A dry run
    /// only reports what would go. Returns git's report either way.
    pub async fn clean_working_directory(&self, dry_run: bool, directories: bool) -> Result<String> {
        let mut args = vec!["clean", if dry_run { "-n" } else { "-f" }];
        if directories {
            args.push("-d");
        }
        if dry_run {
            self.git(&args).await
        } else {
            self.mutate(&args, &[]).await
        }
    }

    /// Overwrites a work-tree file with `lines`, creating missing parent
    /// directories. Non-empty content ends with a newline.
    pub async fn save_file_content(&self, path: &str, lines: &[String]) -> Result<()> {
        let full = self.worktree_path(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut content = lines.join("\n");
        if !lines.is_empty() {
            content.push('\n');
        }
        tokio::fs::write(&full, content).await?;
        tracing::debug!(path, lines = lines.len(), "file saved");
        Ok(())
    }
}
