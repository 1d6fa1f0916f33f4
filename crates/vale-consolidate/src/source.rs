//! Where consolidation gets voucher items from.

use std::collections::BTreeMap;

use vale_registry::Registry;
use vale_types::VoucherItem;

use crate::error::ConsolidationResult;

/// Result of resolving one voucher number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLookup {
    /// No voucher with this number exists.
    Unknown,
    /// The voucher exists but its structured data is unusable.
    Missing { reason: String },
    /// The voucher's line items.
    Items(Vec<VoucherItem>),
}

/// Resolves voucher numbers to their line items.
pub trait VoucherSource {
    fn lookup(&self, number: u64) -> ConsolidationResult<SourceLookup>;
}

impl VoucherSource for Registry {
    fn lookup(&self, number: u64) -> ConsolidationResult<SourceLookup> {
        let Some(record) = self.find_by_number(number)? else {
            return Ok(SourceLookup::Unknown);
        };
        Ok(match self.load_sidecar(&record) {
            Ok(sidecar) => SourceLookup::Items(sidecar.items),
            Err(issue) => SourceLookup::Missing {
                reason: issue.to_string(),
            },
        })
    }
}

/// A fixed set of vouchers held in memory.
///
/// `None` marks a voucher that exists but has no structured data.
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    vouchers: BTreeMap<u64, Option<Vec<VoucherItem>>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a voucher with items.
    pub fn with_items(mut self, number: u64, items: Vec<VoucherItem>) -> Self {
        self.vouchers.insert(number, Some(items));
        self
    }

    /// Add a voucher without structured data.
    pub fn without_items(mut self, number: u64) -> Self {
        self.vouchers.insert(number, None);
        self
    }
}

impl VoucherSource for InMemorySource {
    fn lookup(&self, number: u64) -> ConsolidationResult<SourceLookup> {
        Ok(match self.vouchers.get(&number) {
            None => SourceLookup::Unknown,
            Some(None) => SourceLookup::Missing {
                reason: "no sidecar recorded".into(),
            },
            Some(Some(items)) => SourceLookup::Items(items.clone()),
        })
    }
}
