//! Diff reconstruction and file change summaries.
//!
//! Unified diff text from git is parsed into hunks of numbered lines:
//! - a `@@ -a,b +c,d @@` header closes the previous hunk and opens a new one
//!   (an omitted length means 1)
//! - inside a hunk, `-` consumes an old line, `+` a new line, and a space
//!   (or an empty line) one of each; lines outside a hunk's declared ranges
//!   (`diff`, `index`, `---`, `+++`, `\ No newline...`) are never classified
//!
//! Untracked files are the one case where diff text is synthesized: the whole
//! file becomes a single all-addition hunk against `/dev/null`.
//!
//! File statuses come from git's own `--name-status` codes; `--numstat`
//! only annotates them with line counts.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::git::repository::{GitRepository, check_ref_name, check_relative_path};
use crate::models::{DiffHunk, DiffLine, FileChange, FileDiff, LineType};

/// Revision name standing for the working tree.
pub const UNCOMMITTED: &str = "uncommitted";

/// Object id of the empty tree, the diff base for root commits.
pub const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hunk header pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
}

pub fn parse_hunk_header(line: &str) -> Option<HunkRange> {
    let caps = HUNK_HEADER.captures(line)?;
    let number = |idx: usize, default: u32| -> Option<u32> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(default),
        }
    };

    Some(HunkRange {
        old_start: number(1, 0)?,
        old_lines: number(2, 1)?,
        new_start: number(3, 0)?,
        new_lines: number(4, 1)?,
    })
}

/// A hunk being filled, with line counters and the lines still expected on
/// each side.
struct OpenHunk {
    hunk: DiffHunk,
    old_line: u32,
    new_line: u32,
    old_left: u32,
    new_left: u32,
}

impl OpenHunk {
    fn new(range: HunkRange, header: &str) -> Self {
        Self {
            hunk: DiffHunk {
                old_start: range.old_start,
                old_lines: range.old_lines,
                new_start: range.new_start,
                new_lines: range.new_lines,
                header: header.to_string(),
                lines: Vec::new(),
            },
            old_line: range.old_start,
            new_line: range.new_start,
            old_left: range.old_lines,
            new_left: range.new_lines,
        }
    }

    fn push(&mut self, line: &str) {
        let (line_type, content) = match line.chars().next() {
            Some('-') if self.old_left > 0 => (LineType::Deletion, &line[1..]),
            Some('+') if self.new_left > 0 => (LineType::Addition, &line[1..]),
            Some(' ') if self.old_left > 0 && self.new_left > 0 => (LineType::Context, &line[1..]),
            None if self.old_left > 0 && self.new_left > 0 => (LineType::Context, ""),
            _ => return,
        };
        self.record(line_type, content);
    }

    fn record(&mut self, line_type: LineType, content: &str) {
        let mut line = DiffLine {
            line_type,
            old_lineno: None,
            new_lineno: None,
            content: content.to_string(),
        };
        if line_type != LineType::Addition {
            line.old_lineno = Some(self.old_line);
            self.old_line += 1;
            self.old_left -= 1;
        }
        if line_type != LineType::Deletion {
            line.new_lineno = Some(self.new_line);
            self.new_line += 1;
            self.new_left -= 1;
        }
        self.hunk.lines.push(line);
    }

    fn finish(mut self) -> DiffHunk {
        // Blank trailing context lines are lost when git output is trimmed
        if self.old_left == self.new_left {
            while self.old_left > 0 {
                self.record(LineType::Context, "");
            }
        }
        self.hunk
    }
}

pub fn parse_unified_diff(text: &str) -> Vec<DiffHunk> {
    let mut hunks = Vec::new();
    let mut open: Option<OpenHunk> = None;

    for line in text.lines() {
        if line.starts_with("@@") {
            if let Some(hunk) = open.take() {
                hunks.push(hunk.finish());
            }
            open = parse_hunk_header(line).map(|range| OpenHunk::new(range, line));
            continue;
        }
        if let Some(hunk) = open.as_mut() {
            hunk.push(line);
        }
    }

    if let Some(hunk) = open {
        hunks.push(hunk.finish());
    }
    hunks
}

/// Presents `lines` as a brand-new file.
pub fn synthesize_untracked_diff(path: &str, lines: &[String]) -> String {
    let new_start = if lines.is_empty() { 0 } else { 1 };
    let mut diff = format!(
        "diff --git a/{path} b/{path}\nnew file mode 100644\n--- /dev/null\n+++ b/{path}\n@@ -0,0 +{new_start},{} @@\n",
        lines.len()
    );
    for line in lines {
        diff.push('+');
        diff.push_str(line);
        diff.push('\n');
    }
    diff
}

fn split_fields(line: &str) -> Vec<&str> {
    if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// Parses `--name-status` output (`M\tpath`, `R100\told\tnew`).
pub fn parse_name_status(output: &str) -> Vec<FileChange> {
    let mut changes = Vec::new();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let fields = split_fields(line);
        if fields.len() < 2 {
            continue;
        }

        let status = fields[0].trim().to_string();
        let renamed = (status.starts_with('R') || status.starts_with('C')) && fields.len() >= 3;
        let (path, old_path) = if renamed {
            (fields[2].to_string(), Some(fields[1].to_string()))
        } else {
            (fields[1].to_string(), None)
        };

        changes.push(FileChange {
            path,
            status,
            additions: 0,
            deletions: 0,
            old_path,
        });
    }
    changes
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    pub path: String,
    pub additions: usize,
    pub deletions: usize,
}

/// Resolves numstat rename notation (`old => new`, `dir/{old => new}/f`)
/// to the new path.
fn renamed_path(raw: &str) -> String {
    if let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}')) {
        if open < close {
            if let Some((_, new)) = raw[open + 1..close].split_once(" => ") {
                let joined = format!("{}{}{}", &raw[..open], new, &raw[close + 1..]);
                return joined.replace("//", "/");
            }
        }
    }
    match raw.split_once(" => ") {
        Some((_, new)) => new.to_string(),
        None => raw.to_string(),
    }
}

/// Parses `--numstat` output; `-` (binary) counts as zero.
pub fn parse_numstat(output: &str) -> Vec<NumstatEntry> {
    let mut entries = Vec::new();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let fields: Vec<&str> = if line.contains('\t') {
            line.splitn(3, '\t').collect()
        } else {
            line.split_whitespace().collect()
        };
        if fields.len() < 3 {
            continue;
        }

        entries.push(NumstatEntry {
            path: renamed_path(fields[2]),
            additions: fields[0].parse().unwrap_or(0),
            deletions: fields[1].parse().unwrap_or(0),
        });
    }
    entries
}

/// Annotates name-status changes with numstat counts. Numstat rows without
/// a name-status counterpart are returned separately.
pub fn annotate_changes(
    mut changes: Vec<FileChange>,
    numstat: Vec<NumstatEntry>,
) -> (Vec<FileChange>, Vec<NumstatEntry>) {
    let mut unmatched = Vec::new();
    for entry in numstat {
        match changes.iter_mut().find(|c| c.path == entry.path) {
            Some(change) => {
                change.additions = entry.additions;
                change.deletions = entry.deletions;
            }
            None => unmatched.push(entry),
        }
    }
    (changes, unmatched)
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

impl GitRepository {
    /// Diff of one file at `revision` against its first parent, or of the
    /// working tree against HEAD for [`UNCOMMITTED`].
    pub async fn file_diff(&self, revision: &str, path: &str) -> Result<FileDiff> {
        check_relative_path(path)?;

        let (base, text) = if revision == UNCOMMITTED {
            ("HEAD".to_string(), self.uncommitted_diff_text(path).await?)
        } else {
            check_ref_name("revision", revision)?;
            let base = self.diff_base(revision).await?;
            let text = self
                .git(&["diff", &base, revision, "--", path])
                .await
                .map_err(|e| match e {
                    AppError::Command { .. } => AppError::NotFound(format!("revision {revision}")),
                    other => other,
                })?;
            (base, text)
        };

        let hunks = parse_unified_diff(&text);
        let old_content = self.file_content(&base, path).await.unwrap_or_default();
        let new_content = self.file_content(revision, path).await.unwrap_or_default();

        let diff = FileDiff {
            path: path.to_string(),
            hunks,
            old_content,
            new_content,
        };
        tracing::debug!(
            revision,
            path,
            hunks = diff.hunks.len(),
            additions = diff.additions(),
            deletions = diff.deletions(),
            "diff reconstructed"
        );
        Ok(diff)
    }

    async fn uncommitted_diff_text(&self, path: &str) -> Result<String> {
        let diffed = self.git(&["diff", "HEAD", "--", path]).await;
        let text = match diffed {
            Ok(text) => text,
            // No HEAD yet: only untracked files can have a diff
            Err(AppError::Command { .. }) => String::new(),
            Err(e) => return Err(e),
        };

        if text.trim().is_empty() && self.is_untracked(path).await {
            let lines = self.read_worktree_lines(path).await?;
            return Ok(synthesize_untracked_diff(path, &lines));
        }
        Ok(text)
    }

    /// First parent of `revision`, or the empty tree for a root commit.
    async fn diff_base(&self, revision: &str) -> Result<String> {
        let parent = format!("{revision}^");
        match self
            .git(&["rev-parse", "--verify", "--quiet", &parent])
            .await
        {
            Ok(hash) => Ok(hash.trim().to_string()),
            Err(AppError::Command { .. }) => Ok(EMPTY_TREE.to_string()),
            Err(e) => Err(e),
        }
    }

    async fn is_untracked(&self, path: &str) -> bool {
        match self.git(&["status", "--porcelain", "--", path]).await {
            Ok(status) => status.trim_start().starts_with("??"),
            Err(_) => false,
        }
    }

    async fn read_worktree_lines(&self, path: &str) -> Result<Vec<String>> {
        let full = self.worktree_path(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(split_lines(&String::from_utf8_lossy(&bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("file {path}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// File lines at `revision`, or from the working tree for [`UNCOMMITTED`].
    pub async fn file_content(&self, revision: &str, path: &str) -> Result<Vec<String>> {
        check_relative_path(path)?;
        if revision == UNCOMMITTED {
            return self.read_worktree_lines(path).await;
        }

        check_ref_name("revision", revision)?;
        let object = format!("{revision}:{path}");
        let output = self.git(&["show", &object]).await.map_err(|e| match e {
            AppError::Command { .. } => AppError::NotFound(format!("{path} at {revision}")),
            other => other,
        })?;
        Ok(split_lines(&output))
    }

    async fn object_exists(&self, object: &str) -> bool {
        self.git(&["cat-file", "-e", object]).await.is_ok()
    }

    /// Guesses a status from line counts by probing the parent and current
    /// trees. Only used for rows git gave no status code for.
    pub(crate) async fn infer_status(
        &self,
        hash: &str,
        path: &str,
        additions: usize,
        deletions: usize,
    ) -> &'static str {
        if deletions == 0 && !self.object_exists(&format!("{hash}^:{path}")).await {
            return "A";
        }
        if additions == 0 && !self.object_exists(&format!("{hash}:{path}")).await {
            return "D";
        }
        "M"
    }

    /// Files changed by a commit with native status codes and line counts.
    pub async fn commit_file_changes(&self, hash: &str) -> Vec<FileChange> {
        let name_status = self
            .git(&["show", "--name-status", "-M", "--format=", hash])
            .await
            .map(|out| parse_name_status(&out))
            .unwrap_or_default();
        let numstat = self
            .git(&["show", "--numstat", "-M", "--format=", hash])
            .await
            .map(|out| parse_numstat(&out))
            .unwrap_or_default();

        let (mut changes, unmatched) = annotate_changes(name_status, numstat);
        for entry in unmatched {
            let status = self
                .infer_status(hash, &entry.path, entry.additions, entry.deletions)
                .await;
            changes.push(FileChange {
                path: entry.path,
                status: status.to_string(),
                additions: entry.additions,
                deletions: entry.deletions,
                old_path: None,
            });
        }
        changes
    }

    async fn index_changes(&self, cached: bool, prefix: &str) -> Vec<FileChange> {
        let scope: &[&str] = if cached { &["diff", "--cached"] } else { &["diff"] };
        let run = |flag: &'static str| {
            let mut args = scope.to_vec();
            args.push(flag);
            args
        };

        let name_status = self
            .git(&run("--name-status"))
            .await
            .map(|out| parse_name_status(&out))
            .unwrap_or_default();
        let numstat = self
            .git(&run("--numstat"))
            .await
            .map(|out| parse_numstat(&out))
            .unwrap_or_default();

        let (mut changes, unmatched) = annotate_changes(name_status, numstat);
        changes.extend(unmatched.into_iter().map(|entry| FileChange {
            path: entry.path,
            status: "M".to_string(),
            additions: entry.additions,
            deletions: entry.deletions,
            old_path: None,
        }));

        for change in &mut changes {
            let letter = change.status.chars().next().unwrap_or('M');
            change.status = format!("{prefix}-{}", letter.to_ascii_lowercase());
        }
        changes
    }

    /// Staged, unstaged and untracked changes in the working tree.
    pub async fn uncommitted_changes(&self) -> Vec<FileChange> {
        let mut changes = self.index_changes(true, "staged").await;
        changes.extend(self.index_changes(false, "unstaged").await);

        let untracked = self
            .git(&["ls-files", "--others", "--exclude-standard"])
            .await
            .unwrap_or_default();
        for path in untracked.lines().filter(|l| !l.is_empty()) {
            let additions = match self.read_worktree_lines(path).await {
                Ok(lines) => lines.len(),
                Err(_) => 0,
            };
            changes.push(FileChange {
                path: path.to_string(),
                status: "untracked".to_string(),
                additions,
                deletions: 0,
                old_path: None,
            });
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Settings;
    use crate::git::runner::ScriptedRunner;

    fn numbers(hunk: &DiffHunk) -> (Vec<u32>, Vec<u32>) {
        let old = hunk.lines.iter().filter_map(|l| l.old_lineno).collect();
        let new = hunk.lines.iter().filter_map(|l| l.new_lineno).collect();
        (old, new)
    }

    fn side_counts(hunk: &DiffHunk) -> (u32, u32) {
        let old = hunk.lines.iter().filter(|l| l.line_type != LineType::Addition).count();
        let new = hunk.lines.iter().filter(|l| l.line_type != LineType::Deletion).count();
        (old as u32, new as u32)
    }

    #[test]
    fn numbers_lines_from_hunk_header() {
        let text = "\
diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -10,3 +10,4 @@ fn main() {
 ctx
-del
+a1
+a2";
        let hunks = parse_unified_diff(text);
        assert_eq!(hunks.len(), 1);

        let hunk = &hunks[0];
        assert_eq!((hunk.old_start, hunk.old_lines, hunk.new_start, hunk.new_lines), (10, 3, 10, 4));
        assert_eq!(hunk.header, "@@ -10,3 +10,4 @@ fn main() {");

        let kinds: Vec<LineType> = hunk.lines.iter().take(4).map(|l| l.line_type).collect();
        assert_eq!(
            kinds,
            [LineType::Context, LineType::Deletion, LineType::Addition, LineType::Addition]
        );
        assert_eq!(hunk.lines[0].content, "ctx");
        assert_eq!((hunk.lines[0].old_lineno, hunk.lines[0].new_lineno), (Some(10), Some(10)));
        assert_eq!((hunk.lines[1].old_lineno, hunk.lines[1].new_lineno), (Some(11), None));
        assert_eq!((hunk.lines[2].old_lineno, hunk.lines[2].new_lineno), (None, Some(11)));
        assert_eq!((hunk.lines[3].old_lineno, hunk.lines[3].new_lineno), (None, Some(12)));

        // the trailing blank context line lost to trimming is restored
        let (_, new) = numbers(hunk);
        assert_eq!(new, vec![10, 11, 12, 13]);
        assert_eq!(side_counts(hunk), (3, 4));
    }

    #[test]
    fn line_counts_match_declared_lengths() {
        let text = "\
@@ -1,2 +1,2 @@
-old
+new
 same
@@ -20 +20,2 @@
 keep
+added
\\ No newline at end of file";
        let hunks = parse_unified_diff(text);
        assert_eq!(hunks.len(), 2);
        for hunk in &hunks {
            assert_eq!(side_counts(hunk), (hunk.old_lines, hunk.new_lines));
        }
        assert_eq!(numbers(&hunks[1]), (vec![20], vec![20, 21]));
    }

    #[test]
    fn preamble_of_next_file_is_not_classified() {
        let text = "\
@@ -1 +1 @@
-a
+b
diff --git a/other b/other
--- a/other
+++ b/other
@@ -0,0 +1 @@
+fresh";
        let hunks = parse_unified_diff(text);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].lines.len(), 2);
        assert_eq!(hunks[1].lines.len(), 1);
        assert_eq!(hunks[1].lines[0].new_lineno, Some(1));
    }

    #[test]
    fn explicit_zero_length_is_kept() {
        let range = parse_hunk_header("@@ -5,0 +6,2 @@").unwrap();
        assert_eq!((range.old_lines, range.new_lines), (0, 2));
        assert!(parse_hunk_header("@@ bogus @@").is_none());
    }

    #[test]
    fn name_status_keeps_git_codes_and_renames() {
        let changes = parse_name_status("M\tsrc/a.rs\nR087\told.rs\tnew.rs\nD\tgone.txt\n");
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[1].status, "R087");
        assert_eq!(changes[1].path, "new.rs");
        assert_eq!(changes[1].old_path.as_deref(), Some("old.rs"));
        assert_eq!(changes[2].status, "D");
    }

    #[test]
    fn numstat_normalises_rename_paths() {
        let entries = parse_numstat("3\t1\tsrc/{old => new}/lib.rs\n-\t-\tlogo.png\n0\t0\ta.txt => b.txt");
        assert_eq!(entries[0].path, "src/new/lib.rs");
        assert_eq!((entries[0].additions, entries[0].deletions), (3, 1));
        assert_eq!((entries[1].additions, entries[1].deletions), (0, 0));
        assert_eq!(entries[2].path, "b.txt");
        assert_eq!(renamed_path("{ => sub}/f.rs"), "sub/f.rs");
    }

    fn repo(runner: &Arc<ScriptedRunner>, root: &str) -> GitRepository {
        GitRepository::with_runner(root, runner.clone(), Settings::default())
    }

    #[tokio::test]
    async fn commit_changes_annotate_status_with_counts() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("show --name-status -M --format= c1", "A\tnew.rs\nM\tlib.rs")
                .ok("show --numstat -M --format= c1", "10\t0\tnew.rs\n2\t3\tlib.rs\n0\t4\tstray.rs"),
        );

        let changes = repo(&runner, "/repo").commit_file_changes("c1").await;
        assert_eq!(changes.len(), 3);
        assert_eq!((changes[0].status.as_str(), changes[0].additions), ("A", 10));
        assert_eq!((changes[1].additions, changes[1].deletions), (2, 3));
        // numstat-only row, only deletions and absent from the commit tree
        assert_eq!(changes[2].status, "D");
    }

    #[tokio::test]
    async fn root_commit_diffs_against_empty_tree() {
        let diff = "@@ -0,0 +1,2 @@\n+one\n+two";
        let runner = Arc::new(
            ScriptedRunner::new()
                .fail("rev-parse --verify --quiet root^", "")
                .ok(&format!("diff {EMPTY_TREE} root -- a.txt"), diff)
                .ok("show root:a.txt", "one\ntwo"),
        );

        let file = repo(&runner, "/repo").file_diff("root", "a.txt").await.unwrap();
        assert_eq!(file.hunks.len(), 1);
        assert_eq!(file.additions(), 2);
        assert!(file.old_content.is_empty());
        assert_eq!(file.new_content, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn untracked_file_becomes_single_addition_hunk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("new.txt"), "a\nb\nc\n").unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("diff HEAD -- new.txt", "")
                .ok("status --porcelain -- new.txt", "?? new.txt"),
        );

        let file = repo(&runner, &root).file_diff(UNCOMMITTED, "new.txt").await.unwrap();

        assert_eq!(file.hunks.len(), 1);
        let hunk = &file.hunks[0];
        assert!(hunk.lines.iter().all(|l| l.line_type == LineType::Addition));
        assert_eq!(numbers(hunk).1, vec![1, 2, 3]);
        assert!(file.old_content.is_empty());
        assert_eq!(file.new_content, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn uncommitted_changes_are_prefixed_by_area() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("todo.md"), "x\ny\n").unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let runner = Arc::new(
            ScriptedRunner::new()
                .ok("diff --cached --name-status", "A\tadded.rs")
                .ok("diff --cached --numstat", "4\t0\tadded.rs")
                .ok("diff --name-status", "M\tlib.rs")
                .ok("diff --numstat", "1\t1\tlib.rs")
                .ok("ls-files --others --exclude-standard", "todo.md"),
        );

        let changes = repo(&runner, &root).uncommitted_changes().await;
        let statuses: Vec<&str> = changes.iter().map(|c| c.status.as_str()).collect();
        assert_eq!(statuses, ["staged-a", "unstaged-m", "untracked"]);
        assert_eq!(changes[0].additions, 4);
        assert_eq!(changes[2].additions, 2);
    }

    #[tokio::test]
    async fn file_content_outside_worktree_is_rejected() {
        let runner = Arc::new(ScriptedRunner::new());
        let err = repo(&runner, "/repo")
            .file_content(UNCOMMITTED, "../etc/passwd")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
