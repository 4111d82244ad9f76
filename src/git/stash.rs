//! Stash entries.
//!
//! Stash indices are positional: any push/apply/pop/drop/branch shifts them.
//! Every successful stash mutation bumps the repository's stash generation,
//! and mutations that name an index may pass the generation they were
//! listed under, so a stale index is rejected instead of hitting the wrong
//! entry. Stash lists are never cached.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::git::cache::Category;
use crate::git::diff::parse_name_status;
use crate::git::history::{FIELD_SEPARATOR, parse_git_date};
use crate::git::repository::{GitRepository, check_ref_name};
use crate::models::{Author, Commit, CommitStats, Stash};

static STASH_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^stash@\{(\d+)\}$").expect("stash ref pattern is valid"));

static STASH_BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:WIP on|On) ([^:]+):").expect("stash branch pattern is valid")
});

pub fn stash_ref(index: usize) -> String {
    format!("stash@{{{index}}}")
}

/// Parses `git stash list --format=%gd|%gs`.
pub fn parse_stash_list(output: &str, generation: u64) -> Vec<Stash> {
    let mut stashes = Vec::new();
    for (position, line) in output.lines().filter(|l| !l.is_empty()).enumerate() {
        let Some((reference, message)) = line.split_once(FIELD_SEPARATOR) else {
            continue;
        };

        let index = STASH_REF
            .captures(reference.trim())
            .and_then(|caps| caps[1].parse().ok())
            .unwrap_or(position);
        let branch = STASH_BRANCH
            .captures(message)
            .map(|caps| caps[1].to_string());

        stashes.push(Stash {
            index,
            message: message.to_string(),
            branch,
            reference: stash_ref(index),
            generation,
        });
    }
    stashes
}

impl GitRepository {
    pub async fn list_stashes(&self) -> Vec<Stash> {
        let generation = self.stash_generation();
        match self.git(&["stash", "list", "--format=%gd|%gs"]).await {
            Ok(output) => parse_stash_list(&output, generation),
            Err(e) => {
                tracing::warn!(error = %e, "stash list unavailable, returning empty list");
                Vec::new()
            }
        }
    }

    fn check_stash_generation(&self, expected: Option<u64>) -> Result<()> {
        match expected {
            Some(generation) if generation != self.stash_generation() => Err(AppError::InvalidInput(
                format!(
                    "stash index from generation {generation} is stale (current {}); re-list stashes",
                    self.stash_generation()
                ),
            )),
            _ => Ok(()),
        }
    }

    async fn stash_mutation(&self, args: &[&str], categories: &[Category]) -> Result<()> {
        self.mutate(args, categories).await?;
        let generation = self.bump_stash_generation();
        tracing::debug!(generation, "stash indices invalidated");
        Ok(())
    }

    /// The stash commit with the files it touched.
    pub async fn show_stash(&self, index: usize) -> Result<Commit> {
        let reference = stash_ref(index);
        let not_found = |e: AppError| match e {
            AppError::Command { .. } => AppError::NotFound(format!("stash {reference}")),
            other => other,
        };

        let output = self
            .git(&["log", "--format=%H|%h|%s|%an|%ae|%ad|%cd", "--date=iso", "-1", &reference])
            .await
            .map_err(not_found)?;

        let fields: Vec<&str> = output.lines().next().unwrap_or("").split(FIELD_SEPARATOR).collect();
        if fields.len() < 7 {
            return Err(AppError::NotFound(format!("stash {reference}")));
        }

        let changes = match self
            .git(&["stash", "show", "--name-status", &reference])
            .await
        {
            Ok(output) => parse_name_status(&output),
            Err(_) => Vec::new(),
        };

        let author = Author {
            name: fields[3].to_string(),
            email: fields[4].to_string(),
        };
        Ok(Commit {
            hash: fields[0].to_string(),
            short_hash: fields[1].to_string(),
            message: fields[2].to_string(),
            committer: author.clone(),
            author,
            date: parse_git_date(fields[5]),
            commit_date: parse_git_date(fields[6]),
            parents: Vec::new(),
            refs: vec![reference.clone()],
            stats: CommitStats::from_changes(&changes),
            file_changes: Some(changes),
        })
    }

    pub async fn push_stash(&self, message: Option<&str>, include_untracked: bool) -> Result<()> {
        let mut args = vec!["stash", "push"];
        if include_untracked {
            args.push("-u");
        }
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            args.extend(["-m", message]);
        }
        self.stash_mutation(&args, &[]).await
    }

    pub async fn apply_stash(&self, index: usize, generation: Option<u64>) -> Result<()> {
        self.check_stash_generation(generation)?;
        self.stash_mutation(&["stash", "apply", &stash_ref(index)], &[])
            .await
    }

    pub async fn pop_stash(&self, index: usize, generation: Option<u64>) -> Result<()> {
        self.check_stash_generation(generation)?;
        self.stash_mutation(&["stash", "pop", &stash_ref(index)], &[])
            .await
    }

    pub async fn drop_stash(&self, index: usize, generation: Option<u64>) -> Result<()> {
        self.check_stash_generation(generation)?;
        self.stash_mutation(&["stash", "drop", &stash_ref(index)], &[])
            .await
    }

    /// Checks out a new branch at the stash's base and pops the stash onto it.
    pub async fn branch_from_stash(
        &self,
        branch: &str,
        index: usize,
        generation: Option<u64>,
    ) -> Result<()> {
        check_ref_name("branch", branch)?;
        self.check_stash_generation(generation)?;
        self.stash_mutation(
            &["stash", "branch", branch, &stash_ref(index)],
            &[Category::Branches],
        )
        .await
    }
}
