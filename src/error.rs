//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` enum for all error conditions and implements Axum's
//! `IntoResponse` to automatically convert errors to appropriate HTTP responses
//! with JSON error bodies.
//!
//! Error mappings:
//! - `NotFound`, `RepoNotFound` → 404
//! - `InvalidInput` → 400
//! - `NoRepository` → 409
//! - `Timeout` → 504
//! - `Command`, `Io`, `Internal` → 500

use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// git exited non-zero or could not be started.
    #[error("git command failed: git {command}: {output}")]
    Command { command: String, output: String },

    /// git did not finish in time and was killed.
    #[error("git command timed out after {timeout:?}: git {command}")]
    Timeout { command: String, timeout: Duration },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No repository selected")]
    NoRepository,

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn command(args: &[&str], output: impl Into<String>) -> Self {
        AppError::Command {
            command: args.join(" "),
            output: output.into(),
        }
    }

    pub fn timeout(args: &[&str], timeout: Duration) -> Self {
        AppError::Timeout {
            command: args.join(" "),
            timeout,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) | AppError::RepoNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NoRepository => StatusCode::CONFLICT,
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Command { .. } | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinct_from_command_failure() {
        let timeout = AppError::timeout(&["log", "-1"], Duration::from_secs(5));
        let failure = AppError::command(&["log", "-1"], "fatal: not a git repository");

        assert!(timeout.is_timeout());
        assert!(!failure.is_timeout());
        assert!(failure.to_string().contains("git log -1"));
        assert!(failure.to_string().contains("not a git repository"));
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NoRepository, StatusCode::CONFLICT),
            (
                AppError::timeout(&["status"], Duration::from_secs(1)),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                AppError::command(&["status"], ""),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
