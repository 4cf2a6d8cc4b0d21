//! Best-first search for the cheapest conversion paths.
//!
//! The loop explores the order graph from the spend currency outward,
//! ordering the frontier by the deterministic `(cost, hops, signature,
//! ticket)` key. States that reach the target inside the hop window are
//! handed to the leg materializer; candidates that survive the tolerance
//! window enter the bounded ranked set. Guards are checked once per pop, so
//! a search always terminates gracefully with whatever it has found.

mod dominance;
mod fill;
mod guard;
pub(crate) mod state;

pub use self::guard::GuardReport;
pub use self::state::{PathCost, PathOrderKey, RouteSignature};

use self::dominance::{DominanceRegistry, Registration};
use self::fill::{materialize, FillSeed};
use self::guard::SearchGuards;
use self::state::{PathStep, QueueEntry, SearchState};
use crate::config::PathSearchConfig;
use crate::decimal::{Decimal, RATIO_GUARD_DIGITS};
use crate::error::PrecisionViolation;
use crate::graph::OrderGraph;
use crate::money::{Currency, Money};
use crate::result::{PathResult, RankedPaths};
use crate::CANONICAL_SCALE;
use log::{debug, trace, warn};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Everything a finished search returns: the ranked paths and the guard
/// accounting.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// Materialized results in ascending priority order, at most the
    /// configured result limit of them.
    pub paths: RankedPaths,
    /// What the search spent and which limits, if any, stopped it.
    pub guard: GuardReport,
}

/// Runs a search over `graph` for paths converting the configured spend into
/// `target`.
///
/// The source currency is the spend amount's currency. A source or target
/// that no order touches yields an empty outcome with an idle guard report;
/// so does a hop window no existing path satisfies. Guard trips are reported,
/// never raised.
pub fn search(graph: &OrderGraph, config: &PathSearchConfig, target: &Currency) -> SearchOutcome {
    let source = config.source().clone();
    let mut guards = SearchGuards::new(
        config.max_expansions(),
        config.max_visited_states(),
        config.time_budget(),
    );
    let mut paths = RankedPaths::new(config.result_limit());

    let source_node = match graph.node(&source) {
        Some(node) => node,
        None => return SearchOutcome { paths, guard: guards.report() },
    };
    if graph.node(target).is_none() || target == &source {
        return SearchOutcome { paths, guard: guards.report() };
    }

    let desired = config.spend_amount();
    let ceiling_factor = &Decimal::one(0) + config.heuristic_tolerance();
    let seed = FillSeed::new(
        desired.clone(),
        desired.mul(&ceiling_factor, desired.scale()),
    );
    let min_spend = config.min_spend();
    let max_spend = config.max_spend();

    let mut queue = BinaryHeap::new();
    let mut registry = DominanceRegistry::default();
    let mut next_ticket: u64 = 0;

    let bootstrap = SearchState::bootstrap(source_node, source);
    registry.register(
        source_node,
        bootstrap.signature(),
        bootstrap.cost(),
        bootstrap.hops(),
    );
    let bootstrap_registered = guards.try_visit();
    debug_assert!(bootstrap_registered, "guard limits are validated >= 1");
    queue.push(Reverse(QueueEntry::new(bootstrap, next_ticket)));
    next_ticket += 1;

    'search: while !queue.is_empty() {
        if guards.expansions_exhausted() {
            debug!("expansion limit reached after {} pops", guards.expansions());
            break;
        }
        if guards.time_exhausted() {
            debug!("time budget exhausted after {} pops", guards.expansions());
            break;
        }

        let Reverse(QueueEntry { key, state }) = queue
            .pop()
            .expect("the queue was checked non-empty");
        guards.note_expansion();

        if state.currency() == target && state.hops() >= config.min_hops() {
            // Complete candidates: once the set is full, a strictly worse
            // candidate cannot improve it and neither can anything ranked
            // after it among complete routes. Equal costs keep draining so
            // tie-breaking can still settle on a better signature.
            if paths.is_full() {
                if let Some(worst) = paths.worst_cost() {
                    if state.cost() > worst {
                        debug!("stopping at {}: worse than the retained set", state.signature());
                        break;
                    }
                }
            }

            trace!(
                "materializing {} (cost {}, rate {})",
                state.signature(),
                state.cost(),
                state.product_rate()
            );
            match materialize(graph, state.edges(), &seed, target) {
                Ok(Some(outcome)) => {
                    let spent = outcome.total_spent.amount();
                    if spent < min_spend.amount() || spent > max_spend.amount() {
                        trace!("{} spends outside the tolerance window", state.signature());
                    } else {
                        match residual_tolerance(&outcome.total_spent, desired.amount()) {
                            Ok(residual) => {
                                let result = PathResult::new(
                                    outcome.total_spent,
                                    outcome.total_received,
                                    residual,
                                    outcome.fee_totals,
                                    outcome.legs,
                                );
                                paths.insert(key, result);
                            }
                            Err(violation) => {
                                warn!("dropping {}: {}", state.signature(), violation);
                            }
                        }
                    }
                }
                Ok(None) => {
                    trace!("{} is infeasible", state.signature());
                }
                Err(violation) => {
                    warn!("dropping {}: {}", state.signature(), violation);
                }
            }
            // Terminal node: successors are never relaxed from the target.
            continue;
        }

        if state.hops() >= config.max_hops() {
            continue;
        }

        for (edge_index, to_node, edge) in graph.outgoing(state.node()) {
            // Simple paths only.
            if state.visited(to_node) {
                continue;
            }
            let Some(factor) = edge.cost_factor() else {
                continue;
            };
            if factor.is_zero() {
                continue;
            }
            let inverse_factor = edge
                .inverse_cost_factor()
                .expect("a non-zero cost factor implies a positive spend capacity");

            let successor = state.extend(
                PathStep {
                    edge: edge_index,
                    node: to_node,
                },
                graph.currency(to_node).clone(),
                factor,
                inverse_factor,
            );
            match registry.register(
                to_node,
                successor.signature(),
                successor.cost(),
                successor.hops(),
            ) {
                Registration::Inserted => {
                    if !guards.try_visit() {
                        debug!(
                            "visited-state limit reached at {}",
                            successor.signature()
                        );
                        break 'search;
                    }
                    queue.push(Reverse(QueueEntry::new(successor, next_ticket)));
                    next_ticket += 1;
                }
                Registration::Updated | Registration::Dominated => {
                    trace!("pruning {}", successor.signature());
                }
            }
        }
    }

    SearchOutcome {
        paths,
        guard: guards.report(),
    }
}

/// Relative deviation of the materialized spend from the configured spend.
fn residual_tolerance(spent: &Money, desired: &Decimal) -> Result<Decimal, PrecisionViolation> {
    let deviation = (spent.amount() - desired).abs();
    deviation.div_guarded(desired, CANONICAL_SCALE, RATIO_GUARD_DIGITS)
}
