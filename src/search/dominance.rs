//! Pareto pruning of search states.
//!
//! For every `(node, route signature)` the registry keeps the best
//! `(cost, hops)` seen so far. A newly generated state that cannot beat the
//! record on any axis is dominated and never enqueued. Scoping the records
//! per signature rather than per node is deliberate: distinct routes to the
//! same node stay alive side by side, which is what keeps the top-K output
//! diverse.

use crate::decimal::Decimal;
use crate::search::state::RouteSignature;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// Outcome of registering a state. Only `Inserted` adds a live state; the
/// other two leave the live-state count unchanged and the caller discards
/// the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Registration {
    /// First state for this `(node, signature)`.
    Inserted,
    /// A record already existed and the new state was not dominated; the
    /// record was tightened where the new state weakly improves it.
    Updated,
    /// The existing record is at least as good on both axes.
    Dominated,
}

#[derive(Clone, Debug)]
struct DominanceRecord {
    cost: Decimal,
    hops: u32,
}

/// Per-node, per-signature dominance records.
#[derive(Debug, Default)]
pub(crate) struct DominanceRegistry {
    records: HashMap<NodeIndex, HashMap<RouteSignature, DominanceRecord>>,
}

impl DominanceRegistry {
    /// Registers a `(cost, hops)` observation for a route arriving at `node`.
    pub fn register(
        &mut self,
        node: NodeIndex,
        signature: &RouteSignature,
        cost: &Decimal,
        hops: u32,
    ) -> Registration {
        let slots = self.records.entry(node).or_default();
        match slots.get_mut(signature) {
            None => {
                slots.insert(
                    signature.clone(),
                    DominanceRecord {
                        cost: cost.clone(),
                        hops,
                    },
                );
                Registration::Inserted
            }
            Some(record) => {
                if &record.cost <= cost && record.hops <= hops {
                    return Registration::Dominated;
                }
                // The new state improves at least one axis. Replace the
                // record only when it is not worse on the other; the record
                // must never move strictly backwards on both axes.
                if cost <= &record.cost && hops <= record.hops {
                    record.cost = cost.clone();
                    record.hops = hops;
                }
                Registration::Updated
            }
        }
    }

    /// Number of nodes with at least one record.
    #[cfg(test)]
    pub fn node_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::prelude::*;

    fn signature(route: &str) -> RouteSignature {
        RouteSignature::raw(route)
    }

    #[test]
    fn first_registration_inserts() {
        let mut registry = DominanceRegistry::default();
        let node = NodeIndex::new(0);
        let sig = signature("A->B");
        assert_eq!(
            registry.register(node, &sig, &dec("0.5"), 1),
            Registration::Inserted
        );
        assert_eq!(registry.node_count(), 1);
    }

    #[test]
    fn worse_duplicate_is_dominated() {
        let mut registry = DominanceRegistry::default();
        let node = NodeIndex::new(0);
        let sig = signature("A->B");
        registry.register(node, &sig, &dec("0.5"), 1);

        assert_eq!(
            registry.register(node, &sig, &dec("0.6"), 2),
            Registration::Dominated
        );
        assert_eq!(
            registry.register(node, &sig, &dec("0.5"), 1),
            Registration::Dominated
        );
    }

    #[test]
    fn strictly_better_duplicate_updates_without_inserting() {
        let mut registry = DominanceRegistry::default();
        let node = NodeIndex::new(0);
        let sig = signature("A->B");
        registry.register(node, &sig, &dec("0.5"), 2);

        assert_eq!(
            registry.register(node, &sig, &dec("0.4"), 1),
            Registration::Updated
        );
        // The tightened record now dominates the old one.
        assert_eq!(
            registry.register(node, &sig, &dec("0.5"), 2),
            Registration::Dominated
        );
    }

    #[test]
    fn incomparable_duplicate_keeps_the_record() {
        let mut registry = DominanceRegistry::default();
        let node = NodeIndex::new(0);
        let sig = signature("A->B");
        registry.register(node, &sig, &dec("0.5"), 2);

        // Cheaper but longer: neither dominates, the record stays put.
        assert_eq!(
            registry.register(node, &sig, &dec("0.4"), 3),
            Registration::Updated
        );
        assert_eq!(
            registry.register(node, &sig, &dec("0.5"), 2),
            Registration::Dominated
        );
    }

    #[test]
    fn different_signatures_coexist_at_a_node() {
        let mut registry = DominanceRegistry::default();
        let node = NodeIndex::new(0);
        registry.register(node, &signature("A->B"), &dec("0.5"), 1);

        assert_eq!(
            registry.register(node, &signature("A->C->B"), &dec("0.9"), 2),
            Registration::Inserted
        );
    }

    #[test]
    fn costs_compare_mathematically_across_scales() {
        let mut registry = DominanceRegistry::default();
        let node = NodeIndex::new(0);
        let sig = signature("A->B");
        registry.register(node, &sig, &dec("0.500"), 1);
        assert_eq!(
            registry.register(node, &sig, &dec("0.5"), 1),
            Registration::Dominated
        );
    }
}
