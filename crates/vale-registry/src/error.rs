//! Error types for registry operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A record with this number already exists.
    #[error("voucher number already registered: {0}")]
    DuplicateNumber(u64),

    /// Voucher numbers start at 1.
    #[error("invalid voucher number: {0}")]
    InvalidNumber(u64),

    /// The highest possible voucher number is already taken.
    #[error("voucher numbers exhausted: {0} is already in use")]
    NumbersExhausted(u64),

    /// The index file exists but cannot be parsed.
    #[error("corrupt index {path}: {reason}")]
    CorruptIndex { path: PathBuf, reason: String },

    /// Another process holds the registry lock.
    #[error("registry is locked by another process: {0}")]
    Locked(PathBuf),

    /// The in-memory state lock was poisoned by a panicking writer.
    #[error("registry state lock poisoned")]
    LockPoisoned,

    /// Writing a file into place failed.
    #[error("failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Serialization of the index failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error on the registry directory.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A stored value could not be interpreted.
    #[error(transparent)]
    Type(#[from] vale_types::TypeError),
}

impl RegistryError {
    /// Returns `true` for failures that mean the registry directory cannot
    /// be written (or is owned by another process). Continuing after one of
    /// these risks losing voucher history.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RegistryError::Io(_)
                | RegistryError::Persist { .. }
                | RegistryError::Locked(_)
                | RegistryError::LockPoisoned
        )
    }
}

/// Convenience alias for registry results.
pub type RegistryResult<T> = Result<T, RegistryError>;
