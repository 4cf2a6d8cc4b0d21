//! Top-K currency conversion path search over a book of bounded
//! peer-to-peer orders.
//!
//! An order book is projected onto a directed multigraph of currencies, one
//! edge per order in its taker direction. A best-first search ranks routes
//! by a deterministic `(cost, hops, signature, ticket)` order, prunes the
//! frontier with per-signature dominance records, and bounds its own
//! resource use with cooperative guards. Routes that reach the target are
//! materialized leg by leg into concrete amounts honoring order bounds, fee
//! schedules and the configured tolerance window.
//!
//! All monetary arithmetic is exact decimal with HALF_UP rounding; no
//! floating point touches an amount anywhere in the crate.

#![deny(clippy::unreadable_literal)]

#[cfg(test)]
#[macro_use]
mod test;

mod config;
mod decimal;
mod error;
mod graph;
mod money;
mod orderbook;
mod result;
mod search;

pub use self::config::{PathSearchConfig, DEFAULT_MAX_EXPANSIONS, DEFAULT_MAX_VISITED_STATES};
pub use self::decimal::Decimal;
pub use self::error::{InvalidInput, PrecisionViolation};
pub use self::graph::{CapacityRange, EdgeSegment, OrderEdge, OrderGraph};
pub use self::money::{Currency, ExchangeRate, Money};
pub use self::orderbook::{AssetPair, FeeBreakdown, FeePolicy, Order, OrderSide};
pub use self::result::{PathLeg, PathResult, RankedPaths};
pub use self::search::{
    search, GuardReport, PathCost, PathOrderKey, RouteSignature, SearchOutcome,
};

/// The scale every cost, rate product and published amount is rounded to.
pub const CANONICAL_SCALE: u32 = 18;

/// The largest scale any decimal in the engine may carry.
pub const MAX_SCALE: u32 = 50;

/// API entry point tying an order book's graph to the search.
///
/// Owning the graph here is a convenience; callers that build an
/// [`OrderGraph`] themselves can run [`search`] against it directly.
#[derive(Clone, Debug)]
pub struct Routegraph {
    graph: OrderGraph,
}

impl Routegraph {
    /// Builds the search graph from an iterator of validated orders.
    pub fn new(orders: impl IntoIterator<Item = Order>) -> Self {
        Routegraph {
            graph: OrderGraph::from_orders(orders),
        }
    }

    /// The underlying currency graph.
    pub fn graph(&self) -> &OrderGraph {
        &self.graph
    }

    /// Searches for the top-K cheapest paths from the configured spend
    /// currency into `target`.
    pub fn search(&self, config: &PathSearchConfig, target: &Currency) -> SearchOutcome {
        search(&self.graph, config, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::prelude::*;

    #[test]
    fn facade_wires_graph_and_search_together() {
        let routegraph = Routegraph::new(vec![
            order!(sell "USD"/"EUR" ["10.000", "200.000"] @ "0.900"),
            order!(buy "USD"/"JPY" ["50.000", "200.000"] @ "150.000"),
        ]);
        assert_eq!(routegraph.graph().node_count(), 4);

        let config = PathSearchConfig::new(money("EUR", "100.00"))
            .unwrap()
            .with_tolerance(dec("0"), dec("0.25"))
            .unwrap()
            .with_hops(1, 3)
            .unwrap();
        let outcome = routegraph.search(&config, &currency("JPY"));

        assert_eq!(outcome.paths.len(), 1);
        let path = outcome.paths.first().unwrap();
        assert_eq!(path.total_received(), &money("JPY", "16665"));
        assert_eq!(path.legs().len(), 2);
    }
}
