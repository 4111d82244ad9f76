//! Branches, tags and remotes.
//!
//! Listings are served from the repository's `MetadataCache` while fresh and
//! otherwise re-read from git (with the metadata timeout). A failed listing
//! degrades to an empty list and is not cached. Mutations go through
//! `GitRepository::mutate`, which invalidates the affected category only
//! when git succeeded.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::{AppError, Result};
use crate::git::cache::{Cached, Category};
use crate::git::history::{FIELD_SEPARATOR, GIT_DATE_FORMAT};
use crate::git::repository::{GitRepository, check_ref_name};
use crate::models::{Author, Branch, Remote, Tag, TagKind};

pub const TAG_FORMAT: &str = "--format=%(refname:short)|%(objectname:short)|%(objecttype)|%(subject)|%(taggername)|%(taggeremail)|%(taggerdate:iso)|%(*objectname:short)";

static TAGGER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+) <(.*)> (\d+) ([+-]\d{4})$").expect("tagger pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    Soft,
    Mixed,
    Hard,
}

impl ResetMode {
    /// Unknown modes fall back to `--mixed`, git's own default.
    pub fn parse(mode: &str) -> Self {
        match mode {
            "soft" => ResetMode::Soft,
            "hard" => ResetMode::Hard,
            _ => ResetMode::Mixed,
        }
    }

    fn flag(self) -> &'static str {
        match self {
            ResetMode::Soft => "--soft",
            ResetMode::Mixed => "--mixed",
            ResetMode::Hard => "--hard",
        }
    }
}

/// Parses `git branch -v`. The current branch carries a leading `*`, a
/// branch checked out in a linked worktree a leading `+`; a detached HEAD
/// pseudo-entry is dropped.
pub fn parse_branches(output: &str) -> Vec<Branch> {
    let mut branches = Vec::new();
    for line in output.lines() {
        let line = line.trim_end();
        let is_current = line.starts_with("* ");
        let line = line
            .strip_prefix("* ")
            .or_else(|| line.strip_prefix("+ "))
            .unwrap_or(line)
            .trim_start();
        if line.is_empty() || line.starts_with('(') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(name), Some(hash)) = (fields.next(), fields.next()) else {
            continue;
        };

        branches.push(Branch {
            name: name.to_string(),
            hash: hash.to_string(),
            is_remote: false,
            is_current,
            upstream: None,
        });
    }
    branches
}

fn non_empty(field: Option<&&str>) -> Option<String> {
    field
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
}

/// Fields of `TAG_FORMAT`; the last four follow the subject.
const TAG_FIELDS: usize = 8;

/// Parses `git tag -l` with `TAG_FORMAT`. A subject containing the separator
/// is rejoined, the tagger fields being counted from the end.
pub fn parse_tags(output: &str) -> Vec<Tag> {
    let mut tags = Vec::new();
    for line in output.lines().filter(|l| !l.is_empty()) {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() < 3 {
            continue;
        }

        let tail = fields.len().max(TAG_FIELDS) - 4;
        let message = fields
            .get(3..tail)
            .map(|subject| subject.join("|").trim().to_string())
            .filter(|subject| !subject.is_empty());

        let kind = TagKind::from_object_type(fields[2]);
        let tagger = match (non_empty(fields.get(tail)), non_empty(fields.get(tail + 1))) {
            (Some(name), Some(email)) => Some(Author {
                name,
                email: email.trim_matches(|c| c == '<' || c == '>').to_string(),
            }),
            _ => None,
        };
        let date = non_empty(fields.get(tail + 2))
            .and_then(|d| DateTime::parse_from_str(&d, GIT_DATE_FORMAT).ok())
            .map(|d| d.with_timezone(&Utc));

        tags.push(Tag {
            name: fields[0].trim().to_string(),
            hash: fields[1].trim().to_string(),
            kind,
            message,
            tagger,
            date,
            target_hash: match kind {
                TagKind::Annotated => non_empty(fields.get(tail + 3)),
                TagKind::Lightweight => None,
            },
        });
    }
    tags
}

/// Merges the fetch and push lines of `git remote -v` by remote name,
/// keeping the order in which remotes first appear.
pub fn parse_remotes(output: &str) -> Vec<Remote> {
    let mut remotes: Vec<Remote> = Vec::new();
    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            continue;
        }
        let (name, url, direction) = (fields[0], fields[1], fields[2].trim_matches(|c| c == '(' || c == ')'));

        let idx = match remotes.iter().position(|r| r.name == name) {
            Some(idx) => idx,
            None => {
                remotes.push(Remote {
                    name: name.to_string(),
                    ..Remote::default()
                });
                remotes.len() - 1
            }
        };

        match direction {
            "fetch" => remotes[idx].fetch_url = url.to_string(),
            "push" => remotes[idx].push_url = url.to_string(),
            _ => {}
        }
    }
    remotes
}

/// Parses `git cat-file -p <annotated tag>`.
fn parse_annotated_tag(name: &str, raw: &str) -> Tag {
    let mut tag = Tag {
        name: name.to_string(),
        hash: String::new(),
        kind: TagKind::Annotated,
        message: None,
        tagger: None,
        date: None,
        target_hash: None,
    };

    let mut lines = raw.lines();
    for line in lines.by_ref() {
        if line.is_empty() {
            break;
        }
        if let Some(object) = line.strip_prefix("object ") {
            tag.target_hash = Some(object.trim().to_string());
        } else if let Some(tagger) = line.strip_prefix("tagger ") {
            if let Some(caps) = TAGGER_LINE.captures(tagger) {
                tag.tagger = Some(Author {
                    name: caps[1].to_string(),
                    email: caps[2].to_string(),
                });
                tag.date = caps[3]
                    .parse::<i64>()
                    .ok()
                    .and_then(|ts| DateTime::from_timestamp(ts, 0));
            }
        }
    }

    let message = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    tag.message = (!message.is_empty()).then_some(message);
    tag
}

impl GitRepository {
    async fn cached_listing<T: Cached>(
        &self,
        args: &[&str],
        parse: fn(&str) -> Vec<T>,
    ) -> Vec<T> {
        if let Some(hit) = self.cache().get::<T>() {
            return hit;
        }
        let seen = self.cache().generation::<T>();

        let output = match self
            .git_with_timeout(self.settings().metadata_timeout, args)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(
                    category = T::CATEGORY.as_str(),
                    timed_out = e.is_timeout(),
                    error = %e,
                    "listing unavailable, returning empty list"
                );
                return Vec::new();
            }
        };

        let items = parse(&output);
        self.cache().store(&items, seen);
        items
    }

    pub async fn list_branches(&self) -> Vec<Branch> {
        self.cached_listing(&["branch", "-v"], parse_branches).await
    }

    pub async fn list_tags(&self) -> Vec<Tag> {
        self.cached_listing(&["tag", "-l", TAG_FORMAT], parse_tags).await
    }

    pub async fn list_remotes(&self) -> Vec<Remote> {
        self.cached_listing(&["remote", "-v"], parse_remotes).await
    }

    pub async fn remote_info(&self, name: &str) -> Result<Remote> {
        check_ref_name("remote", name)?;
        let not_found = |e: AppError| match e {
            AppError::Command { .. } => AppError::NotFound(format!("remote {name}")),
            other => other,
        };

        let fetch_url = self
            .git(&["remote", "get-url", name])
            .await
            .map_err(not_found)?;
        let push_url = self
            .git(&["remote", "get-url", "--push", name])
            .await
            .map_err(not_found)?;

        Ok(Remote {
            name: name.to_string(),
            fetch_url: fetch_url.trim().to_string(),
            push_url: push_url.trim().to_string(),
        })
    }

    /// Looks `name` up under `refs/tags/` only, so branch names and commit
    /// hashes are NotFound.
    pub async fn tag_details(&self, name: &str) -> Result<Tag> {
        check_ref_name("tag", name)?;
        let tag_ref = format!("refs/tags/{name}");
        let object_type = self
            .git(&["cat-file", "-t", &tag_ref])
            .await
            .map_err(|e| match e {
                AppError::Command { .. } => AppError::NotFound(format!("tag {name}")),
                other => other,
            })?;

        if TagKind::from_object_type(&object_type) == TagKind::Lightweight {
            let target = self.git(&["rev-list", "-n", "1", &tag_ref]).await?;
            let target = target.trim().to_string();
            return Ok(Tag {
                name: name.to_string(),
                hash: target.clone(),
                kind: TagKind::Lightweight,
                message: None,
                tagger: None,
                date: None,
                target_hash: Some(target),
            });
        }

        let raw = self.git(&["cat-file", "-p", &tag_ref]).await?;
        let mut tag = parse_annotated_tag(name, &raw);
        if let Ok(hash) = self.git(&["rev-parse", &tag_ref]).await {
            tag.hash = hash.trim().to_string();
        }
        Ok(tag)
    }

    pub async fn checkout_branch(&self, branch: &str) -> Result<()> {
        check_ref_name("branch", branch)?;
        self.mutate(&["checkout", branch], &[Category::Branches])
            .await?;
        Ok(())
    }

    /// Creates `name` (optionally at `start_point`) and switches to it.
    pub async fn create_branch(&self, name: &str, start_point: Option<&str>) -> Result<()> {
        check_ref_name("branch", name)?;
        let mut args = vec!["checkout", "-b", name];
        if let Some(start) = start_point.filter(|s| !s.is_empty()) {
            check_ref_name("start point", start)?;
            args.push(start);
        }
        self.mutate(&args, &[Category::Branches]).await?;
        Ok(())
    }

    pub async fn delete_branch(&self, name: &str, force: bool) -> Result<()> {
        check_ref_name("branch", name)?;
        let flag = if force { "-D" } else { "-d" };
        self.mutate(&["branch", flag, name], &[Category::Branches])
            .await?;
        Ok(())
    }

    pub async fn rename_branch(&self, old_name: &str, new_name: &str) -> Result<()> {
        check_ref_name("branch", old_name)?;
        check_ref_name("branch", new_name)?;
        self.mutate(&["branch", "-m", old_name, new_name], &[Category::Branches])
            .await?;
        Ok(())
    }

    pub async fn merge_branch(&self, name: &str, no_fast_forward: bool) -> Result<()> {
        check_ref_name("branch", name)?;
        let mut args = vec!["merge"];
        if no_fast_forward {
            args.push("--no-ff");
        }
        args.push(name);
        self.mutate(&args, &[Category::Branches]).await?;
        Ok(())
    }

    pub async fn reset(&self, target: &str, mode: ResetMode) -> Result<()> {
        check_ref_name("commit", target)?;
        self.mutate(&["reset", mode.flag(), target], &[Category::Branches])
            .await?;
        Ok(())
    }

    pub async fn cherry_pick(&self, hash: &str) -> Result<()> {
        check_ref_name("commit", hash)?;
        self.mutate(&["cherry-pick", hash], &[Category::Branches])
            .await?;
        Ok(())
    }

    /// Reverts `hash`; with `no_commit` the inverse change is only staged.
    pub async fn revert(&self, hash: &str, no_commit: bool) -> Result<()> {
        check_ref_name("commit", hash)?;
        let mut args = vec!["revert"];
        if no_commit {
            args.push("--no-commit");
        }
        args.push(hash);
        self.mutate(&args, &[Category::Branches]).await?;
        Ok(())
    }

    /// Rebases the current branch onto `target`. Never interactive.
    pub async fn rebase(&self, target: &str) -> Result<()> {
        check_ref_name("branch", target)?;
        self.mutate(&["rebase", target], &[Category::Branches])
            .await?;
        Ok(())
    }

    /// Fetches one remote, or all of them when `remote` is `None`.
    pub async fn fetch(&self, remote: Option<&str>, prune: bool) -> Result<()> {
        let mut args = vec!["fetch"];
        match remote.filter(|r| !r.is_empty()) {
            Some(remote) => {
                check_ref_name("remote", remote)?;
                args.push(remote);
            }
            None => args.push("--all"),
        }
        if prune {
            args.push("--prune");
        }
        self.mutate(&args, &[Category::Branches, Category::Remotes])
            .await?;
        Ok(())
    }

    /// `git pull [remote [branch]]`; a branch without a remote is ignored.
    pub async fn pull(&self, remote: Option<&str>, branch: Option<&str>) -> Result<()> {
        let args = remote_and_branch("pull", &[], remote, branch)?;
        self.mutate(&args, &[Category::Branches]).await?;
        Ok(())
    }

    /// `git push [--force] [remote [branch]]`. Local refs do not move, so
    /// nothing is invalidated.
    pub async fn push(&self, remote: Option<&str>, branch: Option<&str>, force: bool) -> Result<()> {
        let flags: &[&str] = if force { &["--force"] } else { &[] };
        let args = remote_and_branch("push", flags, remote, branch)?;
        self.git(&args).await?;
        Ok(())
    }

    /// Creates a tag at `target` (HEAD if `None`). A message makes it
    /// annotated when `annotated` is set.
    pub async fn create_tag(
        &self,
        name: &str,
        target: Option<&str>,
        message: Option<&str>,
        annotated: bool,
    ) -> Result<()> {
        check_ref_name("tag", name)?;
        let mut args = vec!["tag"];
        match message.filter(|m| annotated && !m.is_empty()) {
            Some(message) => args.extend(["-a", name, "-m", message]),
            None => args.push(name),
        }
        if let Some(target) = target.filter(|t| !t.is_empty()) {
            check_ref_name("commit", target)?;
            args.push(target);
        }
        self.mutate(&args, &[Category::Tags]).await?;
        Ok(())
    }

    pub async fn delete_tag(&self, name: &str) -> Result<()> {
        check_ref_name("tag", name)?;
        self.mutate(&["tag", "-d", name], &[Category::Tags]).await?;
        Ok(())
    }

    pub async fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        check_ref_name("remote", remote)?;
        check_ref_name("tag", name)?;
        self.git(&["push", remote, name]).await?;
        Ok(())
    }

    pub async fn push_all_tags(&self, remote: &str) -> Result<()> {
        check_ref_name("remote", remote)?;
        self.git(&["push", remote, "--tags"]).await?;
        Ok(())
    }
}

fn remote_and_branch<'a>(
    command: &'a str,
    flags: &[&'a str],
    remote: Option<&'a str>,
    branch: Option<&'a str>,
) -> Result<Vec<&'a str>> {
    let mut args = vec![command];
    args.extend_from_slice(flags);
    if let Some(remote) = remote.filter(|r| !r.is_empty()) {
        check_ref_name("remote", remote)?;
        args.push(remote);
        if let Some(branch) = branch.filter(|b| !b.is_empty()) {
            check_ref_name("branch", branch)?;
            args.push(branch);
        }
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::Settings;
    use crate::git::runner::ScriptedRunner;

    const BRANCH_OUTPUT: &str = "\
* main      1a2b3c4 Fix bug
  feature/x 5d6e7f8 WIP parser";

    fn repo(runner: &Arc<ScriptedRunner>) -> GitRepository {
        GitRepository::with_runner("/repo", runner.clone(), Settings::default())
    }

    #[test]
    fn branches_mark_current() {
        let branches = parse_branches(BRANCH_OUTPUT);
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].name, "main");
        assert_eq!(branches[0].hash, "1a2b3c4");
        assert!(branches[0].is_current);
        assert_eq!(branches[1].name, "feature/x");
        assert!(!branches[1].is_current);
    }

    #[test]
    fn detached_head_entry_is_dropped() {
        let output = "* (HEAD detached at 1a2b3c4) 1a2b3c4 msg\n  main 1a2b3c4 msg";
        let branches = parse_branches(output);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "main");
    }

    #[test]
    fn tags_distinguish_kinds() {
        let output = "\
v1.0|1111111|commit|Initial release||||
v2.0|2222222|tag|Second release|Jane|<jane@x.com>|2024-03-01 12:00:00 +0000|abcdef0";
        let tags = parse_tags(output);

        assert_eq!(tags[0].kind, TagKind::Lightweight);
        assert!(tags[0].tagger.is_none());
        assert!(tags[0].target_hash.is_none());

        assert_eq!(tags[1].kind, TagKind::Annotated);
        assert_eq!(tags[1].tagger.as_ref().unwrap().email, "jane@x.com");
        assert_eq!(tags[1].message.as_deref(), Some("Second release"));
        assert_eq!(tags[1].target_hash.as_deref(), Some("abcdef0"));
        assert!(tags[1].date.is_some());
    }

    #[test]
    fn remotes_merge_fetch_and_push() {
        let output = "\
origin\tgit@example.com:a/b.git (fetch)
origin\tgit@example.com:a/b-push.git (push)
upstream\thttps://example.com/u/b.git (fetch)
upstream\thttps://example.com/u/b.git (push)";
        let remotes = parse_remotes(output);

        assert_eq!(remotes.len(), 2);
        assert_eq!(remotes[0].name, "origin");
        assert_eq!(remotes[0].fetch_url, "git@example.com:a/b.git");
        assert_eq!(remotes[0].push_url, "git@example.com:a/b-push.git");
        assert_eq!(remotes[1].name, "upstream");
    }

    #[test]
    fn annotated_tag_body() {
        let raw = "\
object 0123456789abcdef
type commit
tag v1.0
tagger Jane Doe <jane@x.com> 1704103200 +0000

Release 1.0

Notes here.";
        let tag = parse_annotated_tag("v1.0", raw);
        assert_eq!(tag.target_hash.as_deref(), Some("0123456789abcdef"));
        assert_eq!(tag.tagger.as_ref().unwrap().name, "Jane Doe");
        assert_eq!(tag.date.unwrap().timestamp(), 1_704_103_200);
        assert_eq!(tag.message.as_deref(), Some("Release 1.0\n\nNotes here."));
    }

    #[tokio::test]
    async fn second_branch_listing_within_ttl_hits_cache() {
        let runner = Arc::new(ScriptedRunner::new().ok("branch -v", BRANCH_OUTPUT));
        let repo = repo(&runner);

        let first = repo.list_branches().await;
        let second = repo.list_branches().await;

        assert_eq!(first, second);
        assert_eq!(runner.count("branch -v"), 1);
    }

    #[tokio::test]
    async fn checkout_invalidates_branches() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("branch -v", BRANCH_OUTPUT)
                .ok("checkout feature/x", ""),
        );
        let repo = repo(&runner);

        repo.list_branches().await;
        repo.checkout_branch("feature/x").await.unwrap();
        repo.list_branches().await;

        assert_eq!(runner.count("branch -v"), 2);
    }

    #[tokio::test]
    async fn failed_tag_creation_keeps_cached_tags() {
        let list = format!("tag -l {TAG_FORMAT}");
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok(&list, "v1.0|1111111|commit|Initial release||||")
                .fail("tag v1.0", "fatal: tag 'v1.0' already exists"),
        );
        let repo = repo(&runner);

        let before = repo.list_tags().await;
        let err = repo.create_tag("v1.0", None, None, false).await.unwrap_err();
        assert!(matches!(err, AppError::Command { .. }));

        let after = repo.list_tags().await;
        assert_eq!(before, after);
        assert_eq!(runner.count(&list), 1);
    }

    #[tokio::test]
    async fn annotated_tag_creation_passes_message() {
        let runner = Arc::new(ScriptedRunner::new().ok("tag -a v3 -m Third abc123", ""));
        repo(&runner)
            .create_tag("v3", Some("abc123"), Some("Third"), true)
            .await
            .unwrap();
        assert_eq!(runner.count("tag -a v3 -m Third abc123"), 1);
    }

    #[tokio::test]
    async fn failed_listing_is_empty_and_not_cached() {
        let runner = Arc::new(ScriptedRunner::new().timeout("remote -v"));
        let repo = repo(&runner);

        assert!(repo.list_remotes().await.is_empty());
        assert!(repo.list_remotes().await.is_empty());
        assert_eq!(runner.count("remote -v"), 2);
    }

    #[tokio::test]
    async fn lightweight_tag_details() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("cat-file -t refs/tags/v1.0", "commit")
                .ok("rev-list -n 1 refs/tags/v1.0", "abc123"),
        );
        let tag = repo(&runner).tag_details("v1.0").await.unwrap();
        assert_eq!(tag.kind, TagKind::Lightweight);
        assert_eq!(tag.target_hash.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn missing_tag_is_not_found() {
        let runner = Arc::new(ScriptedRunner::new().fail("cat-file -t refs/tags/nope", "fatal: Not a valid object name"));
        let err = repo(&runner).tag_details("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn fetch_invalidates_remotes_and_branches() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("remote -v", "origin\tu (fetch)\norigin\tu (push)")
                .ok("fetch --all --prune", ""),
        );
        let repo = repo(&runner);

        repo.list_remotes().await;
        repo.fetch(None, true).await.unwrap();
        assert!(!repo.cache().is_fresh(Category::Remotes));
    }

    #[test]
    fn linked_worktree_branches_are_not_current() {
        let output = "\
* main    1a2b3c4 Fix bug
+ feature 5d6e7f8 WIP
  release 9a8b7c6 Bump version";
        let branches = parse_branches(output);

        let names: Vec<_> = branches.iter().map(|b| (b.name.as_str(), b.hash.as_str())).collect();
        assert_eq!(names, [("main", "1a2b3c4"), ("feature", "5d6e7f8"), ("release", "9a8b7c6")]);
        assert!(branches[0].is_current);
        assert!(!branches[1].is_current);
        assert!(!branches[2].is_current);
    }

    #[test]
    fn tag_subject_may_contain_separator() {
        let output = "v2.0|2222222|tag|Fix a|b parsing|Jane|<jane@x.com>|2024-03-01 12:00:00 +0000|abcdef0";
        let tags = parse_tags(output);

        assert_eq!(tags[0].message.as_deref(), Some("Fix a|b parsing"));
        assert_eq!(tags[0].tagger.as_ref().unwrap().name, "Jane");
        assert_eq!(tags[0].tagger.as_ref().unwrap().email, "jane@x.com");
        assert!(tags[0].date.is_some());
        assert_eq!(tags[0].target_hash.as_deref(), Some("abcdef0"));
    }

    #[tokio::test]
    async fn checkout_during_slow_listing_is_not_masked() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .delayed("branch -v", Duration::from_millis(100), BRANCH_OUTPUT)
                .ok("checkout dev", ""),
        );
        let repo = Arc::new(repo(&runner));

        let listing = tokio::spawn({
            let repo = repo.clone();
            async move { repo.list_branches().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        repo.checkout_branch("dev").await.unwrap();
        assert_eq!(listing.await.unwrap().len(), 2);

        repo.list_branches().await;
        assert_eq!(runner.count("branch -v"), 2);
    }

    #[tokio::test]
    async fn branch_name_is_not_a_tag() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("cat-file -t main", "commit")
                .fail("cat-file -t refs/tags/main", "fatal: Not a valid object name refs/tags/main"),
        );
        let err = repo(&runner).tag_details("main").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(runner.count("cat-file -t main"), 0);
    }

    #[tokio::test]
    async fn annotated_tag_details_read_the_tag_ref() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("cat-file -t refs/tags/v2.0", "tag")
                .ok(
                    "cat-file -p refs/tags/v2.0",
                    "object abc123\ntype commit\ntag v2.0\ntagger Jane <jane@x.com> 1704103200 +0000\n\nSecond",
                )
                .ok("rev-parse refs/tags/v2.0", "fed321"),
        );
        let tag = repo(&runner).tag_details("v2.0").await.unwrap();
        assert_eq!(tag.kind, TagKind::Annotated);
        assert_eq!(tag.hash, "fed321");
        assert_eq!(tag.target_hash.as_deref(), Some("abc123"));
        assert_eq!(tag.message.as_deref(), Some("Second"));
    }

    #[tokio::test]
    async fn pull_invalidates_branches() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("branch -v", BRANCH_OUTPUT)
                .ok("pull origin main", "Already up to date."),
        );
        let repo = repo(&runner);

        repo.list_branches().await;
        repo.pull(Some("origin"), Some("main")).await.unwrap();
        repo.list_branches().await;

        assert_eq!(runner.count("branch -v"), 2);
    }

    #[tokio::test]
    async fn cherry_pick_invalidates_branches() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("branch -v", BRANCH_OUTPUT)
                .ok("cherry-pick 5d6e7f8", ""),
        );
        let repo = repo(&runner);

        repo.list_branches().await;
        repo.cherry_pick("5d6e7f8").await.unwrap();
        repo.list_branches().await;

        assert_eq!(runner.count("branch -v"), 2);
    }

    #[tokio::test]
    async fn revert_invalidates_branches() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("branch -v", BRANCH_OUTPUT)
                .ok("revert --no-commit 1a2b3c4", ""),
        );
        let repo = repo(&runner);

        repo.list_branches().await;
        repo.revert("1a2b3c4", true).await.unwrap();
        repo.list_branches().await;

        assert_eq!(runner.count("branch -v"), 2);
    }

    #[tokio::test]
    async fn rebase_invalidates_branches() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("branch -v", BRANCH_OUTPUT)
                .ok("rebase main", ""),
        );
        let repo = repo(&runner);

        repo.list_branches().await;
        repo.rebase("main").await.unwrap();
        repo.list_branches().await;

        assert_eq!(runner.count("branch -v"), 2);
    }

    #[tokio::test]
    async fn failed_rebase_keeps_cached_branches() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("branch -v", BRANCH_OUTPUT)
                .fail("rebase main", "CONFLICT (content): Merge conflict in src/lib.rs"),
        );
        let repo = repo(&runner);

        repo.list_branches().await;
        assert!(repo.rebase("main").await.is_err());
        assert!(repo.cache().is_fresh(Category::Branches));
    }

    #[tokio::test]
    async fn push_builds_force_and_target() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("push --force origin feature/x", "")
                .ok("push", ""),
        );
        let repo = repo(&runner);

        repo.push(Some("origin"), Some("feature/x"), true).await.unwrap();
        repo.push(None, Some("ignored"), false).await.unwrap();

        assert_eq!(runner.calls(), ["push --force origin feature/x", "push"]);
    }

    #[tokio::test]
    async fn pull_rejects_option_like_remote() {
        let runner = Arc::new(ScriptedRunner::new());
        let err = repo(&runner).pull(Some("--upload-pack=x"), None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(runner.calls().is_empty());
    }
}
