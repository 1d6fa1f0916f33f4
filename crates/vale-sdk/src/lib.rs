//! High-level SDK for the voucher registry.
//!
//! [`Vales`] ties the registry, the consolidation engine, and the merge
//! chain together behind one handle. This is the entry point for
//! applications that issue vouchers or build unified ones.

pub mod config;
pub mod error;
pub mod render;
pub mod vales;

pub use config::ValeConfig;
pub use error::{SdkError, SdkResult};
pub use render::{DocumentBody, RenderError, RenderRequest, Renderer, TextRenderer};
pub use vales::{UnifiedVoucher, Vales};

// Re-export key types
pub use vale_consolidate::{Consolidation, ConsolidationError, MissingData};
pub use vale_merge::{MergeConfig, MergeError, MergeOutcome};
pub use vale_registry::{RegistryConfig, RegistryError, ReindexReport, SidecarIssue, VerifyReport};
pub use vale_types::{ConsolidatedLine, Status, VoucherItem, VoucherRecord};
