//! The consolidation engine.

use serde::Serialize;
use tracing::{debug, info, warn};
use vale_types::ConsolidatedLine;

use crate::aggregate::Aggregator;
use crate::error::{ConsolidationError, ConsolidationResult};
use crate::source::{SourceLookup, VoucherSource};

/// A selected voucher that could not contribute to the numeric aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MissingData {
    pub number: u64,
    pub reason: String,
}

/// Result of a successful consolidation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Consolidation {
    /// Aggregated lines, in first-seen key order.
    pub lines: Vec<ConsolidatedLine>,
    /// Vouchers whose items were aggregated, in selection order.
    pub included: Vec<u64>,
    /// Vouchers left out of the sum for lack of structured data.
    pub missing_structured: Vec<MissingData>,
    /// Selected numbers that are not in the registry.
    pub unknown: Vec<u64>,
}

impl Consolidation {
    /// Returns `true` if every selected voucher contributed.
    pub fn is_complete(&self) -> bool {
        self.missing_structured.is_empty() && self.unknown.is_empty()
    }

    /// Sum of all line quantities, or `None` if it does not fit in a `u64`.
    pub fn total_quantity(&self) -> Option<u64> {
        self.lines
            .iter()
            .try_fold(0u64, |acc, line| acc.checked_add(line.quantity))
    }
}

/// Consolidates vouchers resolved through a [`VoucherSource`].
pub struct ConsolidationEngine<'a, S: VoucherSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: VoucherSource + ?Sized> ConsolidationEngine<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Aggregate the items of the selected vouchers.
    ///
    /// Repeated numbers in the selection are consolidated once. Vouchers
    /// without usable structured data are excluded from the sum and listed
    /// in [`Consolidation::missing_structured`]. If no selected voucher
    /// contributes any item, the result is
    /// [`ConsolidationError::NoStructuredData`] rather than an empty table.
    pub fn consolidate(&self, numbers: &[u64]) -> ConsolidationResult<Consolidation> {
        if numbers.is_empty() {
            return Err(ConsolidationError::EmptySelection);
        }

        let mut selection: Vec<u64> = Vec::with_capacity(numbers.len());
        for &n in numbers {
            if !selection.contains(&n) {
                selection.push(n);
            }
        }

        let mut aggregator = Aggregator::new();
        let mut result = Consolidation::default();

        for number in selection {
            match self.source.lookup(number)? {
                SourceLookup::Unknown => {
                    warn!(number, "selected voucher not found");
                    result.unknown.push(number);
                }
                SourceLookup::Missing { reason } => {
                    warn!(number, %reason, "voucher has no structured data; excluded from totals");
                    result.missing_structured.push(MissingData { number, reason });
                }
                SourceLookup::Items(items) if items.is_empty() => {
                    result.missing_structured.push(MissingData {
                        number,
                        reason: "sidecar lists no items".into(),
                    });
                }
                SourceLookup::Items(items) => {
                    debug!(number, items = items.len(), "aggregating voucher");
                    aggregator.add_voucher(number, &items)?;
                    result.included.push(number);
                }
            }
        }

        if aggregator.is_empty() {
            return Err(ConsolidationError::NoStructuredData {
                missing: result.missing_structured,
                unknown: result.unknown,
            });
        }

        result.lines = aggregator.finish();
        info!(
            vouchers = result.included.len(),
            lines = result.lines.len(),
            missing = result.missing_structured.len(),
            "consolidation complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;
    use vale_types::VoucherItem;

    fn item(product: &str, lot: &str, location: &str, qty: u64) -> VoucherItem {
        VoucherItem::new(product, lot, location, None, qty)
    }

    fn scenario() -> InMemorySource {
        InMemorySource::new()
            .with_items(1, vec![item("GauzeA", "L1", "ShelfX", 3)])
            .with_items(2, vec![item("GauzeA", "L1", "ShelfX", 2), item("TapeB", "L2", "ShelfY", 1)])
            .without_items(3)
    }

    #[test]
    fn consolidates_two_vouchers() {
        let source = scenario();
        let result = ConsolidationEngine::new(&source).consolidate(&[1, 2]).unwrap();
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].quantity, 5);
        assert_eq!(result.lines[0].origin_numbers, vec![1, 2]);
        assert_eq!(result.lines[1].quantity, 1);
        assert_eq!(result.lines[1].origin_numbers, vec![2]);
        assert!(result.is_complete());
        assert_eq!(result.total_quantity(), Some(6));
    }

    #[test]
    fn missing_sidecar_is_reported_not_dropped() {
        let source = scenario();
        let result = ConsolidationEngine::new(&source).consolidate(&[3, 1]).unwrap();
        assert_eq!(result.included, vec![1]);
        assert_eq!(result.missing_structured.len(), 1);
        assert_eq!(result.missing_structured[0].number, 3);
        assert_eq!(result.lines[0].quantity, 3);
    }

    #[test]
    fn unknown_numbers_are_listed() {
        let source = scenario();
        let result = ConsolidationEngine::new(&source).consolidate(&[1, 99]).unwrap();
        assert_eq!(result.unknown, vec![99]);
        assert!(!result.is_complete());
    }

    #[test]
    fn no_structured_data_is_an_error() {
        let source = scenario();
        let err = ConsolidationEngine::new(&source).consolidate(&[3, 42]).unwrap_err();
        match err {
            ConsolidationError::NoStructuredData { missing, unknown } => {
                assert_eq!(missing.len(), 1);
                assert_eq!(unknown, vec![42]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_item_list_counts_as_missing() {
        let source = InMemorySource::new().with_items(1, Vec::new());
        let err = ConsolidationEngine::new(&source).consolidate(&[1]).unwrap_err();
        assert!(matches!(err, ConsolidationError::NoStructuredData { .. }));
    }

    #[test]
    fn empty_selection_is_an_error() {
        let source = scenario();
        let err = ConsolidationEngine::new(&source).consolidate(&[]).unwrap_err();
        assert!(matches!(err, ConsolidationError::EmptySelection));
    }

    #[test]
    fn total_across_lines_reports_overflow() {
        let source = InMemorySource::new()
            .with_items(1, vec![item("GauzeA", "L1", "ShelfX", u64::MAX)])
            .with_items(2, vec![item("TapeB", "L2", "ShelfY", 1)]);
        let result = ConsolidationEngine::new(&source).consolidate(&[1, 2]).unwrap();
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].quantity, u64::MAX);
        assert_eq!(result.total_quantity(), None);
    }

    #[test]
    fn repeated_selection_is_counted_once() {
        let source = scenario();
        let result = ConsolidationEngine::new(&source).consolidate(&[1, 1, 2]).unwrap();
        assert_eq!(result.lines[0].quantity, 5);
        assert_eq!(result.included, vec![1, 2]);
    }
}
