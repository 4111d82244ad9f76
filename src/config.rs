//! Runtime settings shared by every repository handle.
//!
//! Built once from the command line in `main` and cloned into each
//! `GitRepository`, so cache TTL and command timeouts stay per-handle
//! constants rather than globals.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    /// How long a branches/tags/remotes snapshot stays fresh
    pub cache_ttl: Duration,
    /// Timeout for history queries (`git log`)
    pub log_timeout: Duration,
    /// Timeout for branch/tag/remote listings
    pub metadata_timeout: Duration,
    /// Default page size for commit lists
    pub default_limit: usize,
    /// Directory scanned for repositories in multi-repo mode
    pub scan_root: Option<PathBuf>,
    pub scan_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30),
            log_timeout: Duration::from_secs(10),
            metadata_timeout: Duration::from_secs(5),
            default_limit: 50,
            scan_root: None,
            scan_depth: 3,
        }
    }
}
