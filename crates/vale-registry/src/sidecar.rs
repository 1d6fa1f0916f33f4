//! Sidecar reading and writing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use vale_types::{Sidecar, TypeError};

use crate::error::{RegistryError, RegistryResult};
use crate::fsio::write_atomic;

/// Why a voucher's structured data is unavailable.
#[derive(Debug, Error)]
pub enum SidecarIssue {
    /// The record does not reference a sidecar.
    #[error("no sidecar recorded")]
    NotRecorded,

    /// The referenced sidecar file does not exist.
    #[error("sidecar file not found: {0}")]
    Missing(PathBuf),

    /// The sidecar file exists but could not be read.
    #[error("sidecar unreadable: {0}")]
    Unreadable(#[source] io::Error),

    /// The sidecar could not be parsed or failed validation.
    #[error("sidecar invalid: {0}")]
    Invalid(#[source] TypeError),
}

/// Read and validate the sidecar at `path`.
pub fn read_sidecar(path: &Path) -> Result<Sidecar, SidecarIssue> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SidecarIssue::Missing(path.to_path_buf()))
        }
        Err(e) => return Err(SidecarIssue::Unreadable(e)),
    };
    Sidecar::from_json(&bytes).map_err(SidecarIssue::Invalid)
}

/// Write a sidecar document atomically.
pub fn write_sidecar(path: &Path, json: &[u8]) -> RegistryResult<()> {
    write_atomic(path, json)
}

/// Serialize and write a plain sidecar.
pub fn save_sidecar(path: &Path, sidecar: &Sidecar) -> RegistryResult<()> {
    let bytes = sidecar.to_json().map_err(RegistryError::Type)?;
    write_atomic(path, &bytes)
}
