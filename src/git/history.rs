//! Commit history queries.
//!
//! `git log` is asked for one commit per line in a fixed `|`-separated
//! layout: hash, short hash, subject, author name, author email, author
//! date, committer date, parent hashes (space separated). Pagination is left
//! to git (`--skip`, `-N`), so ordering is exactly git's: newest first.
//!
//! Read paths here never fail: a git error or timeout yields an empty list,
//! and a malformed line or timestamp only affects that one record.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::git::repository::{GitRepository, check_ref_name};
use crate::models::{Author, Commit, CommitStats};

pub const LOG_FORMAT: &str = "--pretty=format:%H|%h|%s|%an|%ae|%ad|%cd|%P";
pub const FIELD_SEPARATOR: char = '|';
const LOG_FIELDS: usize = 8;
/// `--date=iso` output, e.g. `2024-01-01 10:00:00 +0000`
pub const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Parses a git ISO timestamp; anything unparseable becomes the epoch.
pub fn parse_git_date(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_str(raw.trim(), GIT_DATE_FORMAT)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}

/// Parses one `LOG_FORMAT` line. `refs` is left empty for the caller.
///
/// A subject containing the separator produces extra fields; they are folded
/// back into the subject since every other field is fixed-position.
pub fn parse_log_line(line: &str) -> Option<Commit> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() < LOG_FIELDS || fields[0].is_empty() {
        return None;
    }

    let tail = fields.len() - 5;
    let subject = fields[2..tail].join("|");
    let author = Author {
        name: fields[tail].to_string(),
        email: fields[tail + 1].to_string(),
    };

    Some(Commit {
        hash: fields[0].to_string(),
        short_hash: fields[1].to_string(),
        message: subject,
        committer: author.clone(),
        author,
        date: parse_git_date(fields[tail + 2]),
        commit_date: parse_git_date(fields[tail + 3]),
        parents: fields[tail + 4]
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        refs: Vec::new(),
        stats: CommitStats::default(),
        file_changes: None,
    })
}

/// Splits `%D` decoration output (`HEAD -> main, tag: v1.0, origin/main`).
pub fn parse_decorations(output: &str) -> Vec<String> {
    output
        .split(", ")
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn log_args(limit: usize, offset: usize, reference: Option<&str>, all: bool) -> Vec<String> {
    let mut args = vec![
        "log".to_string(),
        LOG_FORMAT.to_string(),
        "--date=iso".to_string(),
    ];
    if offset > 0 {
        args.push(format!("--skip={offset}"));
    }
    if limit > 0 {
        args.push(format!("-{limit}"));
    }
    if all {
        args.push("--all".to_string());
    } else if let Some(reference) = reference.filter(|r| !r.is_empty()) {
        args.push(reference.to_string());
    }
    args
}

impl GitRepository {
    /// Lists commits newest-first. `all` spans every ref and ignores `branch`;
    /// an empty `branch` means HEAD.
    pub async fn list_commits(
        &self,
        limit: usize,
        offset: usize,
        branch: &str,
        all: bool,
    ) -> Vec<Commit> {
        if !all && !branch.is_empty() && check_ref_name("branch", branch).is_err() {
            return Vec::new();
        }
        self.read_log(log_args(limit, offset, Some(branch), all)).await
    }

    /// History reachable from a tag or any other ref.
    pub async fn list_commits_for_ref(
        &self,
        reference: &str,
        limit: usize,
        offset: usize,
    ) -> Vec<Commit> {
        if check_ref_name("ref", reference).is_err() {
            return Vec::new();
        }
        self.read_log(log_args(limit, offset, Some(reference), false))
            .await
    }

    async fn read_log(&self, args: Vec<String>) -> Vec<Commit> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = match self
            .git_with_timeout(self.settings().log_timeout, &args)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(timed_out = e.is_timeout(), error = %e, "commit history unavailable, returning empty list");
                return Vec::new();
            }
        };

        let mut commits = Vec::new();
        for line in output.lines().filter(|l| !l.is_empty()) {
            let Some(mut commit) = parse_log_line(line) else {
                tracing::debug!(line, "skipping malformed log line");
                continue;
            };
            commit.refs = self.commit_refs(&commit.hash).await;
            commits.push(commit);
        }
        commits
    }

    /// Branch and tag names decorating `hash`; empty on any failure.
    pub async fn commit_refs(&self, hash: &str) -> Vec<String> {
        match self
            .git(&["log", "--decorate=short", "--format=%D", "-1", hash])
            .await
        {
            Ok(output) => parse_decorations(&output),
            Err(_) => Vec::new(),
        }
    }

    /// A single commit with refs, file changes and aggregate stats.
    pub async fn commit_details(&self, hash: &str) -> Result<Commit> {
        check_ref_name("commit", hash)?;
        let output = self
            .git(&["log", LOG_FORMAT, "--date=iso", "-1", hash])
            .await
            .map_err(|e| match e {
                AppError::Command { .. } => AppError::NotFound(format!("commit {hash}")),
                other => other,
            })?;

        let mut commit = output
            .lines()
            .next()
            .and_then(parse_log_line)
            .ok_or_else(|| AppError::NotFound(format!("commit {hash}")))?;

        commit.refs = self.commit_refs(&commit.hash).await;
        let changes = self.commit_file_changes(&commit.hash).await;
        commit.stats = CommitStats::from_changes(&changes);
        commit.file_changes = Some(changes);
        Ok(commit)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Settings;
    use crate::git::runner::ScriptedRunner;

    const LOG_CMD: &str = "log --pretty=format:%H|%h|%s|%an|%ae|%ad|%cd|%P --date=iso";

    fn repo(runner: &Arc<ScriptedRunner>) -> GitRepository {
        GitRepository::with_runner("/repo", runner.clone(), Settings::default())
    }

    #[test]
    fn root_commit_has_empty_parent_list() {
        let line = "abc123|abc12|Fix bug|Jane|jane@x.com|2024-01-01 10:00:00 +0000|2024-01-01 10:00:00 +0000|";
        let commit = parse_log_line(line).unwrap();

        assert_eq!(commit.hash, "abc123");
        assert_eq!(commit.short_hash, "abc12");
        assert_eq!(commit.message, "Fix bug");
        assert_eq!(commit.author.name, "Jane");
        assert_eq!(commit.author.email, "jane@x.com");
        assert!(commit.parents.is_empty());
        assert_eq!(commit.date.to_rfc3339(), "2024-01-01T10:00:00+00:00");
    }

    #[test]
    fn merge_commit_lists_both_parents() {
        let line = "m1|m1s|Merge|A|a@x|2024-02-01 09:00:00 +0100|2024-02-01 09:00:00 +0100|p1 p2";
        let commit = parse_log_line(line).unwrap();
        assert_eq!(commit.parents, vec!["p1", "p2"]);
        assert_eq!(commit.date.to_rfc3339(), "2024-02-01T08:00:00+00:00");
    }

    #[test]
    fn bad_timestamp_yields_epoch_not_failure() {
        let line = "h|s|msg|A|a@x|yesterday|not a date|";
        let commit = parse_log_line(line).unwrap();
        assert_eq!(commit.date, DateTime::<Utc>::default());
        assert_eq!(commit.commit_date, DateTime::<Utc>::default());
    }

    #[test]
    fn short_lines_are_rejected() {
        assert!(parse_log_line("abc|def|only three").is_none());
        assert!(parse_log_line("").is_none());
    }

    #[test]
    fn separator_in_subject_is_kept() {
        let line = "h|s|a | b|A|a@x|2024-01-01 10:00:00 +0000|2024-01-01 10:00:00 +0000|p";
        let commit = parse_log_line(line).unwrap();
        assert_eq!(commit.message, "a | b");
        assert_eq!(commit.parents, vec!["p"]);
    }

    #[test]
    fn decorations_split_on_commas() {
        assert_eq!(
            parse_decorations("HEAD -> main, tag: v1.0, origin/main"),
            vec!["HEAD -> main", "tag: v1.0", "origin/main"]
        );
        assert!(parse_decorations("").is_empty());
    }

    #[test]
    fn log_args_paginate_server_side() {
        assert_eq!(
            log_args(20, 40, Some("dev"), false)[3..],
            ["--skip=40", "-20", "dev"]
        );
        assert_eq!(log_args(20, 0, Some("dev"), true)[3..], ["-20", "--all"]);
        assert_eq!(log_args(0, 0, Some(""), false).len(), 3);
    }

    #[tokio::test]
    async fn lists_every_well_formed_line_with_refs() {
        let output = "\
aaa|a|first|A|a@x|2024-01-02 10:00:00 +0000|2024-01-02 10:00:00 +0000|bbb
garbage line
bbb|b|second|B|b@x|2024-01-01 10:00:00 +0000|2024-01-01 10:00:00 +0000|";
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok(&format!("{LOG_CMD} -2"), output)
                .ok("log --decorate=short --format=%D -1 aaa", "HEAD -> main, tag: v2")
                .fail("log --decorate=short --format=%D -1 bbb", "boom"),
        );

        let commits = repo(&runner).list_commits(2, 0, "", false).await;

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "aaa");
        assert_eq!(commits[0].refs, vec!["HEAD -> main", "tag: v2"]);
        assert_eq!(commits[1].hash, "bbb");
        assert!(commits[1].refs.is_empty());
        assert!(commits[1].parents.is_empty());
    }

    #[tokio::test]
    async fn failed_or_timed_out_log_is_empty() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .fail(&format!("{LOG_CMD} -5"), "fatal: not a git repository")
                .timeout(&format!("{LOG_CMD} -5 --all")),
        );
        let repo = repo(&runner);

        assert!(repo.list_commits(5, 0, "", false).await.is_empty());
        assert!(repo.list_commits(5, 0, "ignored", true).await.is_empty());
    }

    #[tokio::test]
    async fn option_like_branch_is_never_passed_to_git() {
        let runner = Arc::new(ScriptedRunner::new());
        assert!(repo(&runner).list_commits(5, 0, "--output=x", false).await.is_empty());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_commit_is_not_found() {
        let runner = Arc::new(
            ScriptedRunner::new().fail(&format!("{LOG_CMD} -1 nope"), "fatal: bad revision"),
        );
        let err = repo(&runner).commit_details("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
