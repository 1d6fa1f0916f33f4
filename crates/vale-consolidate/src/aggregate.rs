//! Pure aggregation of voucher items into consolidated lines.

use std::collections::HashMap;

use vale_types::{ConsolidatedLine, LineKey, VoucherItem};

use crate::error::{ConsolidationError, ConsolidationResult};

/// Incremental aggregator.
///
/// Lines come out in the order their key was first seen, so the result
/// reads like a natural merge of the input vouchers rather than a sorted
/// table.
#[derive(Debug, Default)]
pub struct Aggregator {
    positions: HashMap<LineKey, usize>,
    lines: Vec<ConsolidatedLine>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one item contributed by voucher `origin`.
    pub fn add(&mut self, origin: u64, item: &VoucherItem) -> ConsolidationResult<()> {
        let key = item.key();
        let position = match self.positions.get(&key) {
            Some(&pos) => pos,
            None => {
                self.lines.push(ConsolidatedLine::new(key.clone()));
                self.positions.insert(key, self.lines.len() - 1);
                self.lines.len() - 1
            }
        };

        let line = &mut self.lines[position];
        line.quantity = line
            .quantity
            .checked_add(item.quantity)
            .ok_or_else(|| ConsolidationError::QuantityOverflow(line.key.clone()))?;
        if !line.origin_numbers.contains(&origin) {
            line.origin_numbers.push(origin);
        }
        Ok(())
    }

    /// Add every item of one voucher.
    pub fn add_voucher(&mut self, origin: u64, items: &[VoucherItem]) -> ConsolidationResult<()> {
        items.iter().try_for_each(|item| self.add(origin, item))
    }

    /// Number of distinct lines so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn finish(self) -> Vec<ConsolidatedLine> {
        self.lines
    }
}

/// Aggregate `(voucher number, items)` pairs in the given order.
pub fn aggregate<'a, I>(vouchers: I) -> ConsolidationResult<Vec<ConsolidatedLine>>
where
    I: IntoIterator<Item = (u64, &'a [VoucherItem])>,
{
    let mut aggregator = Aggregator::new();
    for (origin, items) in vouchers {
        aggregator.add_voucher(origin, items)?;
    }
    Ok(aggregator.finish())
}
