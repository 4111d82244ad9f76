//! Repository selection DTOs for multi-repo mode.
//!
//! - `RepositoryInfo`: A discovered repository, flagged if currently served
//! - `SwitchRepoRequest`: Request body for switching repositories

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub path: String,
    pub current: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchRepoRequest {
    pub path: String,
}
