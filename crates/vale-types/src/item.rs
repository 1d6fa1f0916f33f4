//! Voucher line items and their aggregated form.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single line of a voucher: what was withdrawn, from where, and how much.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherItem {
    pub product: String,
    pub lot: String,
    pub location: String,
    #[serde(default, with = "crate::timestamp::expiry")]
    pub expiry: Option<NaiveDate>,
    pub quantity: u64,
}

impl VoucherItem {
    /// Create a new item.
    pub fn new(
        product: impl Into<String>,
        lot: impl Into<String>,
        location: impl Into<String>,
        expiry: Option<NaiveDate>,
        quantity: u64,
    ) -> Self {
        Self {
            product: product.into(),
            lot: lot.into(),
            location: location.into(),
            expiry,
            quantity,
        }
    }

    /// The composite key this item aggregates under.
    pub fn key(&self) -> LineKey {
        LineKey {
            product: self.product.clone(),
            lot: self.lot.clone(),
            location: self.location.clone(),
            expiry: self.expiry,
        }
    }
}

/// Composite aggregation key: `(product, lot, location, expiry)`.
///
/// Two items share a line only when all four components are equal; no
/// normalization (trimming, case folding) is applied.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    pub product: String,
    pub lot: String,
    pub location: String,
    #[serde(default, with = "crate::timestamp::expiry")]
    pub expiry: Option<NaiveDate>,
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.product, self.lot, self.location)?;
        match self.expiry {
            Some(date) => write!(f, " / {}", date.format("%Y-%m-%d")),
            None => f.write_str(" / -"),
        }
    }
}

/// One aggregated line produced by consolidation.
///
/// `quantity` is the exact sum of every contributing item. `origin_numbers`
/// lists each contributing voucher once, in order of first contribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedLine {
    #[serde(flatten)]
    pub key: LineKey,
    pub quantity: u64,
    #[serde(rename = "origins", default)]
    pub origin_numbers: Vec<u64>,
}

impl ConsolidatedLine {
    /// Start a line from its first contributing item.
    pub fn new(key: LineKey) -> Self {
        Self {
            key,
            quantity: 0,
            origin_numbers: Vec::new(),
        }
    }

    /// Human-readable list of origin vouchers, e.g. `"#1, #2"`.
    pub fn origins_label(&self) -> String {
        self.origin_numbers
            .iter()
            .map(|n| format!("#{n}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_without_expiry_field_deserializes() {
        let json = r#"{"product":"GauzeA","lot":"L1","location":"ShelfX","quantity":3}"#;
        let item: VoucherItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.expiry, None);
        assert_eq!(item.quantity, 3);
    }

    #[test]
    fn item_with_empty_expiry_is_none() {
        let json = r#"{"product":"P","lot":"L","location":"S","expiry":"","quantity":1}"#;
        let item: VoucherItem = serde_json::from_str(json).unwrap();
        assert!(item.expiry.is_none());
    }

    #[test]
    fn key_distinguishes_expiry() {
        let a = VoucherItem::new("P", "L", "S", None, 1);
        let b = VoucherItem::new("P", "L", "S", NaiveDate::from_ymd_opt(2027, 5, 1), 1);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), VoucherItem::new("P", "L", "S", None, 9).key());
    }

    #[test]
    fn consolidated_line_reads_back_as_item() {
        let mut line = ConsolidatedLine::new(VoucherItem::new("P", "L", "S", None, 1).key());
        line.quantity = 7;
        line.origin_numbers = vec![4, 9];
        let json = serde_json::to_string(&line).unwrap();
        assert!(json.contains("\"origins\":[4,9]"));

        let item: VoucherItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, VoucherItem::new("P", "L", "S", None, 7));
        assert_eq!(line.origins_label(), "#4, #9");
    }

    #[test]
    fn key_display() {
        let key = VoucherItem::new("TapeB", "L2", "ShelfY", None, 1).key();
        assert_eq!(key.to_string(), "TapeB / L2 / ShelfY / -");
    }
}
