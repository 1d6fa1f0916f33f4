//! Consolidation of several vouchers into one list of aggregated lines.
//!
//! Items are grouped by their composite key `(product, lot, location,
//! expiry)`. Quantities are summed exactly (overflow is an error, never a
//! wrap), and each line remembers which vouchers contributed to it.
//!
//! - [`aggregate`]: The pure aggregation over already-loaded item lists
//! - [`engine`]: [`ConsolidationEngine`]: resolves numbers through a
//!   [`VoucherSource`] and reports vouchers without structured data
//! - [`source`]: The [`VoucherSource`] seam, implemented for the registry
//!   and for an in-memory map

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod source;

pub use aggregate::{aggregate, Aggregator};
pub use engine::{Consolidation, ConsolidationEngine, MissingData};
pub use error::{ConsolidationError, ConsolidationResult};
pub use source::{InMemorySource, SourceLookup, VoucherSource};
