use std::path::PathBuf;

use crate::backend::BackendAttempt;

/// Errors that can occur while merging artifacts.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Nothing to merge.
    #[error("no input artifacts given")]
    EmptyInput,

    /// An input artifact does not exist.
    #[error("input artifact not found: {0}")]
    MissingInput(PathBuf),

    /// The backend cannot run in this environment (tool not installed,
    /// unsupported input type).
    #[error("backend '{backend}' unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    /// The backend ran and failed.
    #[error("backend '{backend}' failed: {reason}")]
    Failed { backend: String, reason: String },

    /// Every backend in the chain failed.
    #[error("no merge backend succeeded: {}", summarize(attempts))]
    NoBackendAvailable { attempts: Vec<BackendAttempt> },

    /// Backend configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error while staging or moving the output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MergeError {
    /// Create an `Unavailable` error.
    pub fn unavailable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// Create a `Failed` error.
    pub fn failed(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

fn summarize(attempts: &[BackendAttempt]) -> String {
    if attempts.is_empty() {
        return "no backends configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.backend, a.reason.as_deref().unwrap_or("unknown")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
