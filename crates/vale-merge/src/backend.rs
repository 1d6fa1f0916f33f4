use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::MergeError;

/// One way of combining several documents into one.
///
/// Backends are object-safe and `Send + Sync` so they can be stored in a
/// `Vec<Box<dyn MergeBackend>>`. A backend writes the combined document to
/// `output`; the chain takes care of staging and moving it into place.
pub trait MergeBackend: Send + Sync {
    /// Human-readable name (e.g. "qpdf", "concat").
    fn name(&self) -> &str;

    /// Merge `inputs`, in order, into `output`.
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MergeError>;
}

/// Recorded result of one backend attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackendAttempt {
    /// Name of the backend.
    pub backend: String,
    /// Whether the backend produced the output.
    pub succeeded: bool,
    /// Failure reason, when it did not.
    pub reason: Option<String>,
    /// Wall-clock time the attempt took.
    #[serde(skip)]
    pub elapsed: Duration,
}
