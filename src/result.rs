//! Materialized path results and the bounded ranked set that retains the
//! top K of them.

use crate::decimal::Decimal;
use crate::money::{Currency, Money};
use crate::search::state::PathOrderKey;
use std::collections::BTreeMap;
use std::fmt;

/// One concrete conversion step of a materialized path.
#[derive(Clone, Debug, PartialEq)]
pub struct PathLeg {
    from: Currency,
    to: Currency,
    spent: Money,
    received: Money,
    fees: BTreeMap<Currency, Money>,
}

impl PathLeg {
    pub(crate) fn new(
        from: Currency,
        to: Currency,
        spent: Money,
        received: Money,
        fees: BTreeMap<Currency, Money>,
    ) -> Self {
        PathLeg {
            from,
            to,
            spent,
            received,
            fees,
        }
    }

    pub fn from(&self) -> &Currency {
        &self.from
    }

    pub fn to(&self) -> &Currency {
        &self.to
    }

    /// What the taker handed over on this leg, fees included.
    pub fn spent(&self) -> &Money {
        &self.spent
    }

    /// What the taker received on this leg, net of fees.
    pub fn received(&self) -> &Money {
        &self.received
    }

    /// This leg's fees by currency, in currency order.
    pub fn fees(&self) -> &BTreeMap<Currency, Money> {
        &self.fees
    }
}

impl fmt::Display for PathLeg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}->{} ({} -> {})",
            self.from, self.to, self.spent, self.received
        )
    }
}

/// A fully materialized conversion path from source to target.
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult {
    total_spent: Money,
    total_received: Money,
    residual_tolerance: Decimal,
    fee_breakdown: BTreeMap<Currency, Money>,
    legs: Vec<PathLeg>,
}

impl PathResult {
    pub(crate) fn new(
        total_spent: Money,
        total_received: Money,
        residual_tolerance: Decimal,
        fee_breakdown: BTreeMap<Currency, Money>,
        legs: Vec<PathLeg>,
    ) -> Self {
        debug_assert!(!legs.is_empty());
        PathResult {
            total_spent,
            total_received,
            residual_tolerance,
            fee_breakdown,
            legs,
        }
    }

    /// Total spent in the source currency, the first leg's gross outlay.
    pub fn total_spent(&self) -> &Money {
        &self.total_spent
    }

    /// Total received in the target currency, the last leg's net proceeds.
    pub fn total_received(&self) -> &Money {
        &self.total_received
    }

    /// Relative deviation of the total spent from the configured spend.
    pub fn residual_tolerance(&self) -> &Decimal {
        &self.residual_tolerance
    }

    /// All fees paid along the path, by currency, in currency order.
    pub fn fee_breakdown(&self) -> &BTreeMap<Currency, Money> {
        &self.fee_breakdown
    }

    pub fn legs(&self) -> &[PathLeg] {
        &self.legs
    }

    /// Whether the path is a single direct conversion.
    pub fn is_linear(&self) -> bool {
        self.legs.len() == 1
    }
}

#[derive(Clone, Debug)]
struct RankedEntry {
    key: PathOrderKey,
    result: PathResult,
}

/// A bounded collection of results in ascending priority order.
///
/// Insertion keeps the set sorted by [`PathOrderKey`]. When the set is full
/// the worst entry is evicted only if it is strictly worse than the
/// candidate; on an exact key tie the resident entry wins, keeping the
/// ordering stable across re-insertions.
#[derive(Clone, Debug)]
pub struct RankedPaths {
    limit: usize,
    entries: Vec<RankedEntry>,
}

impl RankedPaths {
    pub(crate) fn new(limit: usize) -> Self {
        debug_assert!(limit >= 1);
        RankedPaths {
            limit,
            entries: Vec::with_capacity(limit.min(64)),
        }
    }

    pub(crate) fn insert(&mut self, key: PathOrderKey, result: PathResult) {
        // Insert after any equal keys so a resident entry wins ties, then
        // drop the overflow from the tail.
        let position = self.entries.partition_point(|entry| entry.key <= key);
        self.entries.insert(position, RankedEntry { key, result });
        if self.entries.len() > self.limit {
            self.entries.pop();
        }
    }

    /// Whether the retention limit is filled.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.limit
    }

    /// The cost of the worst retained result, if any.
    pub(crate) fn worst_cost(&self) -> Option<&Decimal> {
        self.entries.last().map(|entry| entry.key.cost().value())
    }

    /// The best result, if any.
    pub fn first(&self) -> Option<&PathResult> {
        self.entries.first().map(|entry| &entry.result)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Results in ascending priority order.
    pub fn iter(&self) -> impl Iterator<Item = &PathResult> + '_ {
        self.entries.iter().map(|entry| &entry.result)
    }

    /// Order keys in the same order as [`iter`](Self::iter), for callers that
    /// need the ranking metadata.
    pub fn keys(&self) -> impl Iterator<Item = &PathOrderKey> + '_ {
        self.entries.iter().map(|entry| &entry.key)
    }
}
