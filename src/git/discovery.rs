//! Finding repositories below a directory for multi-repo mode.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::RepositoryInfo;

fn is_repository(path: &Path) -> bool {
    path.join(".git").exists()
}

fn walk(dir: &Path, depth: usize, max_depth: usize, found: &mut Vec<PathBuf>) {
    if is_repository(dir) {
        found.push(dir.to_path_buf());
        return;
    }
    if depth >= max_depth {
        return;
    }

    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in read_dir.flatten() {
        let path = entry.path();
        // Skip hidden directories
        if entry.file_name().to_string_lossy().starts_with('.') || !path.is_dir() {
            continue;
        }
        walk(&path, depth + 1, max_depth, found);
    }
}

/// Repository work trees at most `max_depth` levels below `root`. A
/// repository's own subdirectories are not searched.
pub fn find_repositories(root: &Path, max_depth: usize) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(AppError::NotFound(format!("directory {}", root.display())));
    }

    let mut found = Vec::new();
    walk(root, 0, max_depth, &mut found);
    found.sort_by_key(|p| p.to_string_lossy().to_lowercase());
    Ok(found)
}

/// Runs the filesystem walk off the async runtime and marks `current`.
pub async fn discover_repositories(
    root: PathBuf,
    max_depth: usize,
    current: Option<PathBuf>,
) -> Result<Vec<RepositoryInfo>> {
    let paths = tokio::task::spawn_blocking(move || find_repositories(&root, max_depth))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(paths
        .into_iter()
        .map(|path| RepositoryInfo {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            current: current.as_deref() == Some(path.as_path()),
            path: path.to_string_lossy().to_string(),
        })
        .collect())
}
