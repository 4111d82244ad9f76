//! Branch, tag, remote and stash DTOs.
//!
//! - `Branch`: local branch from `git branch -v`, current one flagged
//! - `Tag`: lightweight or annotated tag, with tagger info when annotated
//! - `Remote`: fetch/push URL pair merged from `git remote -v`
//! - `Stash`: positional stash entry, valid only for one stash generation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Author;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub name: String,
    pub hash: String,
    pub is_remote: bool,
    pub is_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Lightweight,
    Annotated,
}

impl TagKind {
    /// Maps a git object type (`%(objecttype)`, `cat-file -t`) to a tag kind.
    pub fn from_object_type(object_type: &str) -> Self {
        if object_type.trim() == "tag" {
            TagKind::Annotated
        } else {
            TagKind::Lightweight
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
    pub hash: String,
    pub kind: TagKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagger: Option<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// Commit an annotated tag points at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remote {
    pub name: String,
    pub fetch_url: String,
    pub push_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stash {
    pub index: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// `stash@{index}`
    pub reference: String,
    /// Stash generation this index belongs to; any stash mutation bumps it
    pub generation: u64,
}
