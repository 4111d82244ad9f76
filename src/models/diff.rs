//! Diff-related DTOs.
//!
//! - `FileDiff`: Single file's changes with hunks and both full sides
//! - `DiffHunk`: Contiguous block of changes with context
//! - `DiffLine`: Single line (addition, deletion, or context)
//!
//! Used by: diff viewer to render side-by-side or unified diff view

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    pub path: String,
    pub hunks: Vec<DiffHunk>,
    /// Full file content before the change, one entry per line
    pub old_content: Vec<String>,
    /// Full file content after the change, one entry per line
    pub new_content: Vec<String>,
}

impl FileDiff {
    pub fn additions(&self) -> usize {
        self.count(LineType::Addition)
    }

    pub fn deletions(&self) -> usize {
        self.count(LineType::Deletion)
    }

    fn count(&self, line_type: LineType) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| l.line_type == line_type)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffHunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub header: String,
    pub lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    pub line_type: LineType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_lineno: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_lineno: Option<u32>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Context,
    Addition,
    Deletion,
}
