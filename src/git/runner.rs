//! External git invocation.
//!
//! `CommandRunner` is the only path by which the rest of the crate talks to
//! git. `GitCli` spawns the real binary rooted at the repository path;
//! tests swap in `ScriptedRunner`, which replays canned output and records
//! every invocation.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{AppError, Result};

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `git <args>` and returns stdout with trailing whitespace removed.
    async fn run(&self, args: &[&str]) -> Result<String>;

    /// Like [`CommandRunner::run`], but kills git once `timeout` elapses and
    /// reports [`AppError::Timeout`].
    async fn run_with_timeout(&self, timeout: Duration, args: &[&str]) -> Result<String>;
}

/// Runs the `git` binary found on `PATH`.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_path: PathBuf,
}

impl GitCli {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for GitCli {
    async fn run(&self, args: &[&str]) -> Result<String> {
        let started = Instant::now();

        // kill_on_drop makes an abandoned future (timeout, aborted task) reap git
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .stdin(Stdio::null())
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(cmd = %args.join(" "), dur_ms = elapsed_ms, err = %e, "git failed to start");
                return Err(AppError::command(args, e.to_string()));
            }
        };

        tracing::debug!(
            cmd = %args.join(" "),
            dur_ms = elapsed_ms,
            ok = output.status.success(),
            "git"
        );

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(AppError::command(args, combined.trim_end()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    async fn run_with_timeout(&self, timeout: Duration, args: &[&str]) -> Result<String> {
        match tokio::time::timeout(timeout, self.run(args)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(cmd = %args.join(" "), ?timeout, "git timed out, killed");
                Err(AppError::timeout(args, timeout))
            }
        }
    }
}

#[cfg(test)]
pub use scripted::ScriptedRunner;
