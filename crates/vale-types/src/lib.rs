//! Foundation types for the voucher registry.
//!
//! A voucher ("vale") is a consumption slip recording items withdrawn from
//! inventory. Every other `vale-*` crate depends on `vale-types`.
//!
//! # Key Types
//!
//! - [`VoucherRecord`]: One registry row per issued or consolidated voucher
//! - [`Status`]: Lifecycle state (Pending / Deducted / Voided)
//! - [`VoucherItem`]: A single withdrawn line inside a sidecar
//! - [`LineKey`]: Composite aggregation key `(product, lot, location, expiry)`
//! - [`ConsolidatedLine`]: An aggregated line with its origin vouchers
//! - [`Sidecar`]: Structured JSON companion of a rendered artifact
//! - [`ArtifactName`]: The `vale_{number:06}_{timestamp}.{ext}` convention

pub mod error;
pub mod item;
pub mod naming;
pub mod record;
pub mod sidecar;
pub mod status;
pub mod timestamp;

pub use error::TypeError;
pub use item::{ConsolidatedLine, LineKey, VoucherItem};
pub use naming::{ArtifactName, ARTIFACT_PREFIX, SIDECAR_EXTENSION};
pub use record::VoucherRecord;
pub use sidecar::{ConsolidatedSidecar, Sidecar};
pub use status::Status;
pub use timestamp::Timestamp;
