use thiserror::Error;
use vale_types::LineKey;

use crate::engine::MissingData;

/// Errors that can occur during consolidation.
#[derive(Debug, Error)]
pub enum ConsolidationError {
    /// No voucher numbers were selected.
    #[error("no vouchers selected")]
    EmptySelection,

    /// None of the selected vouchers has usable structured data. Callers
    /// fall back to merging the rendered artifacts instead.
    #[error("none of the selected vouchers has structured data ({} missing, {} unknown)", missing.len(), unknown.len())]
    NoStructuredData {
        missing: Vec<MissingData>,
        unknown: Vec<u64>,
    },

    /// A summed quantity does not fit in a `u64`.
    #[error("quantity overflow on line {0}")]
    QuantityOverflow(LineKey),

    /// Looking up a voucher failed.
    #[error("registry error: {0}")]
    Registry(#[from] vale_registry::RegistryError),
}

/// Convenience alias for consolidation results.
pub type ConsolidationResult<T> = Result<T, ConsolidationError>;
