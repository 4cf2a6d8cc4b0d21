//! Immutable search states and the deterministic priority order.
//!
//! A state records one partial route: where it stands, what it cost to get
//! there, and the exact edge sequence taken. States are created by edge
//! relaxation and never mutated; a successor owns fresh copies of the route
//! data. The priority order over `(cost, hops, signature, insertion order)`
//! is the single total order every container in the search agrees on, which
//! is what makes identical inputs produce identical outputs.

use crate::decimal::Decimal;
use crate::money::Currency;
use crate::CANONICAL_SCALE;
use petgraph::graph::{EdgeIndex, NodeIndex};
use std::cmp::Ordering;
use std::fmt;

/// Extra working digits carried while accumulating the path cost product.
pub(crate) const COST_GUARD_DIGITS: u32 = 2;

/// The canonical `"A->B->C"` rendering of a route's visited currencies.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteSignature(String);

impl RouteSignature {
    fn root(source: &Currency) -> Self {
        RouteSignature(source.symbol().to_owned())
    }

    fn extended(&self, next: &Currency) -> Self {
        let mut signature = String::with_capacity(self.0.len() + next.symbol().len() + 2);
        signature.push_str(&self.0);
        signature.push_str("->");
        signature.push_str(next.symbol());
        RouteSignature(signature)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds a signature from its rendered form, for tests only.
    #[cfg(test)]
    pub(crate) fn raw(route: &str) -> Self {
        RouteSignature(route.to_owned())
    }
}

impl fmt::Display for RouteSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The accumulated dimensionless cost of a route at the canonical scale.
/// Lower is better: less source value per unit of destination value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathCost(Decimal);

impl PathCost {
    pub(crate) fn new(cost: Decimal) -> Self {
        PathCost(cost.rescale(CANONICAL_SCALE))
    }

    pub fn value(&self) -> &Decimal {
        &self.0
    }
}

impl fmt::Display for PathCost {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The total priority order of the search: cost ascending, then hops, then
/// route signature, then discovery order. Field order drives the derived
/// lexicographic comparison.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathOrderKey {
    cost: PathCost,
    hops: u32,
    signature: RouteSignature,
    insertion_order: u64,
}

impl PathOrderKey {
    pub fn cost(&self) -> &PathCost {
        &self.cost
    }

    pub fn hops(&self) -> u32 {
        self.hops
    }

    pub fn signature(&self) -> &RouteSignature {
        &self.signature
    }

    pub fn insertion_order(&self) -> u64 {
        self.insertion_order
    }

    /// Builds a key from its parts, for tests only.
    #[cfg(test)]
    pub(crate) fn for_tests(
        cost: PathCost,
        hops: u32,
        signature: RouteSignature,
        insertion_order: u64,
    ) -> Self {
        PathOrderKey {
            cost,
            hops,
            signature,
            insertion_order,
        }
    }
}

/// One step of a resolved route, pairing the edge taken with the node it
/// leads to.
#[derive(Clone, Debug)]
pub(crate) struct PathStep {
    pub edge: EdgeIndex,
    pub node: NodeIndex,
}

/// An immutable snapshot of a partial route during the search.
#[derive(Clone, Debug)]
pub(crate) struct SearchState {
    node: NodeIndex,
    currency: Currency,
    cost: Decimal,
    product_rate: Decimal,
    hops: u32,
    route: Vec<NodeIndex>,
    edges: Vec<EdgeIndex>,
    signature: RouteSignature,
}

impl SearchState {
    /// The bootstrap state: standing at the source, unit cost, no hops.
    pub fn bootstrap(node: NodeIndex, source: Currency) -> Self {
        SearchState {
            signature: RouteSignature::root(&source),
            node,
            currency: source,
            cost: Decimal::one(CANONICAL_SCALE),
            product_rate: Decimal::one(CANONICAL_SCALE),
            hops: 0,
            route: vec![node],
            edges: Vec::new(),
        }
    }

    /// Relaxes one edge into a successor state. `cost_factor` is the edge's
    /// spend-over-receive ratio, `inverse_cost_factor` its reciprocal.
    pub fn extend(
        &self,
        step: PathStep,
        currency: Currency,
        cost_factor: &Decimal,
        inverse_cost_factor: &Decimal,
    ) -> Self {
        let cost = self
            .cost
            .mul_guarded(cost_factor, CANONICAL_SCALE, COST_GUARD_DIGITS);
        let product_rate =
            self.product_rate
                .mul_guarded(inverse_cost_factor, CANONICAL_SCALE, COST_GUARD_DIGITS);

        let mut route = Vec::with_capacity(self.route.len() + 1);
        route.extend_from_slice(&self.route);
        route.push(step.node);

        let mut edges = Vec::with_capacity(self.edges.len() + 1);
        edges.extend_from_slice(&self.edges);
        edges.push(step.edge);

        SearchState {
            signature: self.signature.extended(&currency),
            node: step.node,
            currency,
            cost,
            product_rate,
            hops: self.hops + 1,
            route,
            edges,
        }
    }

    pub fn node(&self) -> NodeIndex {
        self.node
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn cost(&self) -> &Decimal {
        &self.cost
    }

    /// The accumulated receive-per-spend rate along the route; the reciprocal
    /// of the cost, tracked separately for reporting.
    pub fn product_rate(&self) -> &Decimal {
        &self.product_rate
    }

    pub fn hops(&self) -> u32 {
        self.hops
    }

    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    pub fn signature(&self) -> &RouteSignature {
        &self.signature
    }

    /// Whether the route has already visited a node. Routes are simple paths:
    /// a successor revisiting any node is rejected.
    pub fn visited(&self, node: NodeIndex) -> bool {
        self.route.contains(&node)
    }

    /// The priority key of this state, stamped with its discovery ticket.
    pub fn order_key(&self, insertion_order: u64) -> PathOrderKey {
        PathOrderKey {
            cost: PathCost::new(self.cost.clone()),
            hops: self.hops,
            signature: self.signature.clone(),
            insertion_order,
        }
    }
}

/// A queue entry: a state plus the key it is ordered by. Comparison is on
/// the key alone; insertion tickets make every key unique.
#[derive(Clone, Debug)]
pub(crate) struct QueueEntry {
    pub key: PathOrderKey,
    pub state: SearchState,
}

impl QueueEntry {
    pub fn new(state: SearchState, insertion_order: u64) -> Self {
        QueueEntry {
            key: state.order_key(insertion_order),
            state,
        }
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}
