//! Data transfer objects (DTOs) for API responses.
//!
//! These structs are serialized to JSON for frontend consumption.
//! - `commit`: Commit, Author, CommitStats, FileChange
//! - `refs`: Branch, Tag, Remote, Stash
//! - `diff`: FileDiff, DiffHunk, DiffLine
//! - `repository`: RepositoryInfo for multi-repo switching
//! - `snapshot`: RepositorySnapshot for the aggregated dashboard view

pub mod commit;
pub mod diff;
pub mod refs;
pub mod repository;
pub mod snapshot;

pub use commit::*;
pub use diff::*;
pub use refs::*;
pub use repository::*;
pub use snapshot::*;
