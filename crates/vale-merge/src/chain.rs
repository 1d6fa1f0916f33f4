use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::backend::{BackendAttempt, MergeBackend};
use crate::backends::{ConcatBackend, ExternalToolBackend};
use crate::config::{BackendSpec, MergeConfig};
use crate::error::{MergeError, MergeResult};

/// Result of a successful [`MergeChain::merge_with_fallback`].
#[derive(Clone, Debug)]
pub struct MergeOutcome {
    /// Name of the backend that produced the output.
    pub backend: String,
    /// Every attempt in order, ending with the successful one.
    pub attempts: Vec<BackendAttempt>,
    /// Total wall-clock time.
    pub elapsed: Duration,
}

/// An ordered list of merge backends, tried until one succeeds.
///
/// The output is written to a staging file in the destination directory and
/// only renamed into place once a backend succeeds, so a failed merge never
/// leaves a partial document at `output`.
#[derive(Default)]
pub struct MergeChain {
    backends: Vec<Box<dyn MergeBackend>>,
}

impl MergeChain {
    /// An empty chain. Use [`Self::add_backend`] to populate it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from configuration, preserving its order.
    pub fn from_config(config: &MergeConfig) -> MergeResult<Self> {
        let mut chain = Self::new();
        for spec in &config.backends {
            let backend: Box<dyn MergeBackend> = match spec {
                BackendSpec::Qpdf => Box::new(ExternalToolBackend::qpdf()),
                BackendSpec::Pdfunite => Box::new(ExternalToolBackend::pdfunite()),
                BackendSpec::Command { name, program, args } => {
                    Box::new(ExternalToolBackend::new(name.clone(), program.clone(), args.clone())?)
                }
                BackendSpec::Concat { extensions } => Box::new(ConcatBackend::new(extensions.clone())),
            };
            chain.add_backend(backend);
        }
        Ok(chain)
    }

    /// Append a backend at the lowest priority.
    pub fn add_backend(&mut self, backend: Box<dyn MergeBackend>) {
        self.backends.push(backend);
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Names of the backends in priority order.
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Merge `inputs` into `output`, trying each backend in priority order.
    ///
    /// Every failure is logged and recorded. The first success wins. If all
    /// backends fail the error lists each attempt and its reason.
    pub fn merge_with_fallback(&self, inputs: &[PathBuf], output: &Path) -> MergeResult<MergeOutcome> {
        let start = Instant::now();
        if inputs.is_empty() {
            return Err(MergeError::EmptyInput);
        }
        if let Some(missing) = inputs.iter().find(|p| !p.is_file()) {
            return Err(MergeError::MissingInput(missing.clone()));
        }

        let dir = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let suffix = staging_suffix(output);

        let mut attempts = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let attempt_start = Instant::now();
            let staging = tempfile::Builder::new()
                .prefix(".vale-merge-")
                .suffix(&suffix)
                .tempfile_in(&dir)?;

            debug!(backend = backend.name(), inputs = inputs.len(), "trying merge backend");
            let result = backend
                .merge(inputs, staging.path())
                .and_then(|()| ensure_produced(backend.name(), staging.path()));

            match result {
                Ok(()) => {
                    staging
                        .persist(output)
                        .map_err(|e| MergeError::Io(e.error))?;
                    attempts.push(BackendAttempt {
                        backend: backend.name().to_string(),
                        succeeded: true,
                        reason: None,
                        elapsed: attempt_start.elapsed(),
                    });
                    info!(
                        backend = backend.name(),
                        inputs = inputs.len(),
                        output = %output.display(),
                        "artifacts merged"
                    );
                    return Ok(MergeOutcome {
                        backend: backend.name().to_string(),
                        attempts,
                        elapsed: start.elapsed(),
                    });
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "merge backend failed; trying next");
                    attempts.push(BackendAttempt {
                        backend: backend.name().to_string(),
                        succeeded: false,
                        reason: Some(failure_reason(&e)),
                        elapsed: attempt_start.elapsed(),
                    });
                    // Dropping `staging` removes whatever the backend wrote.
                }
            }
        }

        Err(MergeError::NoBackendAvailable { attempts })
    }
}

fn staging_suffix(output: &Path) -> String {
    let mut suffix = OsString::from(".partial");
    if let Some(ext) = output.extension() {
        suffix.push(".");
        suffix.push(ext);
    }
    suffix.to_string_lossy().into_owned()
}

fn ensure_produced(backend: &str, path: &Path) -> MergeResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(MergeError::failed(backend, "reported success but wrote no output")),
    }
}

fn failure_reason(err: &MergeError) -> String {
    match err {
        MergeError::Unavailable { reason, .. } | MergeError::Failed { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}
