//! The directed multigraph the search runs over.
//!
//! Currencies are nodes; every order contributes exactly one edge in its
//! taker direction, so parallel edges between the same pair of currencies are
//! expected and preserved. Iteration order is pinned down everywhere because
//! the search's determinism contract depends on it: nodes appear in book
//! first-appearance order and per-node edges in book insertion order.

mod edge;

pub use self::edge::{CapacityRange, EdgeSegment, OrderEdge};
use crate::money::Currency;
use crate::orderbook::Order;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// A graph of conversion opportunities derived from an order book.
#[derive(Clone, Debug)]
pub struct OrderGraph {
    graph: DiGraph<Currency, OrderEdge>,
    nodes: HashMap<Currency, NodeIndex>,
}

impl OrderGraph {
    /// Builds the graph from an iterator of validated orders.
    pub fn from_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();

        for order in orders {
            let edge = OrderEdge::from_order(&order);
            let from = ensure_node(&mut graph, &mut nodes, edge.from());
            let to = ensure_node(&mut graph, &mut nodes, edge.to());
            graph.add_edge(from, to, edge);
        }

        OrderGraph { graph, nodes }
    }

    /// The node for a currency, if any order touches it.
    pub fn node(&self, currency: &Currency) -> Option<NodeIndex> {
        self.nodes.get(currency).copied()
    }

    /// The currency at a node.
    pub fn currency(&self, node: NodeIndex) -> &Currency {
        &self.graph[node]
    }

    /// All currencies in first-appearance order of the order book.
    pub fn currencies(&self) -> impl Iterator<Item = &Currency> + '_ {
        self.graph.node_indices().map(move |node| &self.graph[node])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The edge payload for an edge handle.
    pub fn edge(&self, edge: EdgeIndex) -> &OrderEdge {
        &self.graph[edge]
    }

    /// Outgoing edges of a node in order-book insertion order.
    ///
    /// `petgraph` walks adjacency lists most-recent-first, so the collected
    /// edges are reversed to restore insertion order, which the determinism
    /// contract requires.
    pub fn outgoing(&self, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex, &OrderEdge)> {
        let mut edges: Vec<_> = self
            .graph
            .edges(node)
            .map(|edge| (edge.id(), edge.target(), edge.weight()))
            .collect();
        edges.reverse();
        edges
    }
}

fn ensure_node(
    graph: &mut DiGraph<Currency, OrderEdge>,
    nodes: &mut HashMap<Currency, NodeIndex>,
    currency: &Currency,
) -> NodeIndex {
    match nodes.get(currency) {
        Some(&node) => node,
        None => {
            let node = graph.add_node(currency.clone());
            nodes.insert(currency.clone(), node);
            node
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Decimal;
    use crate::money::Money;
    use crate::orderbook::{FeePolicy, OrderSide};
    use crate::test::prelude::*;

    #[test]
    fn edges_point_in_the_taker_direction() {
        let graph = OrderGraph::from_orders(vec![
            order!(sell "USD"/"EUR" ["10.000", "200.000"] @ "0.900"),
            order!(buy "USD"/"JPY" ["50.000", "200.000"] @ "150.000"),
        ]);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 2);

        // SELL USD/EUR: the taker spends EUR and receives USD.
        let eur = graph.node(&currency("EUR")).unwrap();
        let out = graph.outgoing(eur);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].2.from().symbol(), "EUR");
        assert_eq!(out[0].2.to().symbol(), "USD");

        // BUY USD/JPY: the taker spends USD and receives JPY.
        let usd = graph.node(&currency("USD")).unwrap();
        let out = graph.outgoing(usd);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].2.to().symbol(), "JPY");
    }

    #[test]
    fn nodes_appear_in_book_order() {
        let graph = OrderGraph::from_orders(vec![
            order!(sell "USD"/"EUR" ["10.000", "200.000"] @ "0.900"),
            order!(buy "USD"/"JPY" ["50.000", "200.000"] @ "150.000"),
            order!(sell "JPY"/"EUR" ["10.000", "20000.000"] @ "0.007500"),
        ]);

        let currencies: Vec<_> = graph.currencies().map(Currency::symbol).collect();
        // First appearance order: the sell edge spends EUR into USD, then JPY.
        assert_eq!(currencies, vec!["EUR", "USD", "JPY"]);
    }

    #[test]
    fn parallel_edges_are_preserved_in_insertion_order() {
        let graph = OrderGraph::from_orders(vec![
            order!(buy "EUR"/"USD" ["1.000", "10.000"] @ "1.100"),
            order!(buy "EUR"/"USD" ["1.000", "10.000"] @ "1.050"),
        ]);

        let eur = graph.node(&currency("EUR")).unwrap();
        let out = graph.outgoing(eur);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].2.rate().value(), &dec("1.100"));
        assert_eq!(out[1].2.rate().value(), &dec("1.050"));
    }

    #[test]
    fn capacities_cover_all_three_measures() {
        let graph = OrderGraph::from_orders(vec![
            order!(sell "USD"/"EUR" ["10.000", "200.000"] @ "0.900"),
        ]);
        let eur = graph.node(&currency("EUR")).unwrap();
        let edge = graph.outgoing(eur)[0].2;

        assert_eq!(edge.base_capacity().min(), &money("USD", "10.000"));
        assert_eq!(edge.base_capacity().max(), &money("USD", "200.000"));
        assert_eq!(edge.quote_capacity().min(), &money("EUR", "9.000000"));
        assert_eq!(edge.quote_capacity().max(), &money("EUR", "180.000000"));
        // No base-side fee, so gross base equals net base.
        assert_eq!(edge.gross_base_capacity(), edge.base_capacity());

        // The taker spends quote and receives base on a sell edge.
        assert_eq!(edge.spend_capacity(), edge.quote_capacity());
        assert_eq!(edge.receive_capacity(), edge.base_capacity());
        assert_eq!(edge.cost_factor().unwrap(), &dec("0.9"));
    }

    #[test]
    fn base_fees_widen_the_gross_capacity() {
        let fee = FeePolicy::flat_base(dec("1.5")).unwrap();
        let graph = OrderGraph::from_orders(vec![
            order!(buy "USD"/"JPY" ["50.000", "200.000"] @ "150.000", fee),
        ]);
        let usd = graph.node(&currency("USD")).unwrap();
        let edge = graph.outgoing(usd)[0].2;

        assert_eq!(edge.gross_base_capacity().min(), &money("USD", "51.500"));
        assert_eq!(edge.gross_base_capacity().max(), &money("USD", "201.500"));
        assert_eq!(edge.base_capacity().max(), &money("USD", "200.000"));
    }

    #[test]
    fn segments_split_mandatory_minimum_from_headroom() {
        let graph = OrderGraph::from_orders(vec![
            order!(sell "USD"/"EUR" ["10.000", "200.000"] @ "0.900"),
        ]);
        let eur = graph.node(&currency("EUR")).unwrap();
        let segments = graph.outgoing(eur)[0].2.segments();

        assert_eq!(segments.len(), 2);
        assert!(segments[0].is_mandatory());
        assert_eq!(segments[0].base().max(), &money("USD", "10.000"));
        assert_eq!(segments[0].quote().max(), &money("EUR", "9.000000"));

        assert!(!segments[1].is_mandatory());
        assert!(segments[1].base().min().is_zero());
        assert_eq!(segments[1].base().max(), &money("USD", "190.000"));
        assert_eq!(segments[1].quote().max(), &money("EUR", "171.000000"));
    }

    #[test]
    fn zero_minimum_orders_have_no_mandatory_segment() {
        let graph = OrderGraph::from_orders(vec![
            order!(buy "EUR"/"USD" ["0.000", "10.000"] @ "1.100"),
        ]);
        let eur = graph.node(&currency("EUR")).unwrap();
        let segments = graph.outgoing(eur)[0].2.segments();

        assert_eq!(segments.len(), 1);
        assert!(!segments[0].is_mandatory());
        assert_eq!(segments[0].base().max(), &money("EUR", "10.000"));
    }

    #[test]
    fn pinned_orders_have_no_optional_segment() {
        let graph = OrderGraph::from_orders(vec![
            order!(buy "EUR"/"USD" ["10.000", "10.000"] @ "1.100"),
        ]);
        let eur = graph.node(&currency("EUR")).unwrap();
        let segments = graph.outgoing(eur)[0].2.segments();

        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_mandatory());
    }

    #[test]
    fn zero_capacity_edges_carry_no_cost() {
        let graph = OrderGraph::from_orders(vec![
            order!(buy "EUR"/"USD" ["0.000", "0.000"] @ "1.100"),
        ]);
        let eur = graph.node(&currency("EUR")).unwrap();
        let edge = graph.outgoing(eur)[0].2;
        assert!(edge.cost_factor().is_none());
        assert!(edge.segments().is_empty());
    }

    #[test]
    fn cost_factor_and_its_inverse_are_reciprocal() {
        let graph = OrderGraph::from_orders(vec![
            order!(buy "USD"/"JPY" ["50.000", "200.000"] @ "150.000"),
        ]);
        let usd = graph.node(&currency("USD")).unwrap();
        let edge = graph.outgoing(usd)[0].2;

        assert_eq!(edge.cost_factor().unwrap(), &dec("0.006666666666666667"));
        assert_eq!(edge.inverse_cost_factor().unwrap(), &dec("150"));
    }

    #[test]
    fn order_macro_builds_validated_orders() {
        let order = order!(sell "USD"/"EUR" ["10.000", "200.000"] @ "0.900");
        assert_eq!(order.side(), OrderSide::Sell);
        assert_eq!(order.min_base(), &Money::parse("USD", "10.000").unwrap());
        assert_eq!(order.rate().value(), &Decimal::parse("0.900").unwrap());
    }
}
