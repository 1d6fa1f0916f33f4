use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("cannot load config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("rendering voucher #{number} failed: {reason}")]
    Render { number: u64, reason: String },

    #[error("registry error: {0}")]
    Registry(#[from] vale_registry::RegistryError),

    #[error("consolidation error: {0}")]
    Consolidation(#[from] vale_consolidate::ConsolidationError),

    #[error("merge error: {0}")]
    Merge(#[from] vale_merge::MergeError),

    #[error(transparent)]
    Type(#[from] vale_types::TypeError),
}

pub type SdkResult<T> = Result<T, SdkError>;
