//! Structured sidecar documents paired with rendered artifacts.
//!
//! The sidecar is the authoritative source of a voucher's line items; the
//! rendered artifact is for people, the sidecar is for aggregation.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::item::{ConsolidatedLine, VoucherItem};
use crate::timestamp::Timestamp;

/// Sidecar of an issued voucher.
///
/// Consolidated sidecars ([`ConsolidatedSidecar`]) read back through this
/// type as well; their per-line `origins` are ignored and
/// `consolidated_from` is preserved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    /// Artifact filename this sidecar describes.
    pub filename: String,
    #[serde(with = "crate::timestamp::lenient")]
    pub emission_time: Timestamp,
    #[serde(default)]
    pub items: Vec<VoucherItem>,
    /// Source voucher numbers, for consolidated vouchers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consolidated_from: Vec<u64>,
}

impl Sidecar {
    pub fn new(filename: impl Into<String>, emission_time: Timestamp, items: Vec<VoucherItem>) -> Self {
        Self {
            filename: filename.into(),
            emission_time,
            items,
            consolidated_from: Vec::new(),
        }
    }

    /// Check every item carries a product and a positive quantity.
    pub fn validate(&self) -> Result<(), TypeError> {
        for (index, item) in self.items.iter().enumerate() {
            if item.product.trim().is_empty() {
                return Err(TypeError::InvalidItem {
                    index,
                    reason: "empty product".into(),
                });
            }
            if item.quantity == 0 {
                return Err(TypeError::InvalidItem {
                    index,
                    reason: "quantity must be positive".into(),
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a sidecar from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, TypeError> {
        let sidecar: Self =
            serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))?;
        sidecar.validate()?;
        Ok(sidecar)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec_pretty(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

/// Sidecar of a consolidated voucher: aggregated lines with traceability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedSidecar {
    pub filename: String,
    #[serde(with = "crate::timestamp::lenient")]
    pub emission_time: Timestamp,
    pub consolidated_from: Vec<u64>,
    pub items: Vec<ConsolidatedLine>,
}

impl ConsolidatedSidecar {
    pub fn to_json(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec_pretty(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}
