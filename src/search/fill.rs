//! Leg materialization: turning an abstract edge sequence into concrete
//! per-leg amounts.
//!
//! The walk starts from a seeded spend and resolves one leg at a time. A buy
//! leg spends the order's base: it looks for the largest net base whose gross
//! (net plus base fee) fits the available ceiling. A sell leg spends the
//! order's quote: it derives a candidate base through the inverted rate and
//! tightens it until the quote the order demands matches what the previous
//! leg delivered. Only the first leg may flex its spend, up to the gross
//! ceiling the tolerance window allows; every later leg is pinned by chain
//! propagation.
//!
//! Infeasibility is data, not an error: a candidate that cannot be resolved
//! within bounds and budget yields `None` and the search moves on.

use crate::decimal::{Decimal, RATIO_GUARD_DIGITS};
use crate::error::PrecisionViolation;
use crate::graph::{CapacityRange, OrderEdge, OrderGraph};
use crate::money::{Currency, Money};
use crate::orderbook::{FeeBreakdown, OrderSide};
use crate::result::PathLeg;
use crate::{CANONICAL_SCALE, MAX_SCALE};
use petgraph::graph::EdgeIndex;
use std::collections::BTreeMap;

/// Cap on buy-leg refinement steps.
const BUY_REFINE_ITERATIONS: usize = 12;

/// Cap on sell-leg refinement steps.
const SELL_REFINE_ITERATIONS: usize = 16;

/// Extra working digits carried while matching a sell leg's quote.
const QUOTE_MATCH_GUARD_DIGITS: u32 = 6;

/// Relative tolerance for the sell-leg quote match: 10⁻⁶.
fn quote_match_tolerance() -> Decimal {
    Decimal::from_mantissa(1, 6)
}

/// The spend the first leg starts from: the desired net amount and the
/// ceiling gross spend the tolerance window admits, both in the source
/// currency.
#[derive(Clone, Debug)]
pub(crate) struct FillSeed {
    net: Money,
    gross_ceiling: Money,
}

impl FillSeed {
    pub fn new(net: Money, gross_ceiling: Money) -> Self {
        debug_assert_eq!(net.currency(), gross_ceiling.currency());
        FillSeed { net, gross_ceiling }
    }
}

/// A successfully materialized edge sequence.
#[derive(Clone, Debug)]
pub(crate) struct FillOutcome {
    pub total_spent: Money,
    pub total_received: Money,
    pub legs: Vec<PathLeg>,
    pub fee_totals: BTreeMap<Currency, Money>,
}

/// One resolved leg.
struct LegFill {
    spent: Money,
    received: Money,
    fees: FeeBreakdown,
}

/// Walks the edge sequence, resolving each leg in turn. Returns `None` when
/// the sequence cannot be materialized; arithmetic failures surface as
/// precision violations for the caller to scope to this candidate.
pub(crate) fn materialize(
    graph: &OrderGraph,
    edges: &[EdgeIndex],
    seed: &FillSeed,
    target: &Currency,
) -> Result<Option<FillOutcome>, PrecisionViolation> {
    let source = seed.net.currency().clone();
    let mut current = seed.net.clone();
    let mut remaining_budget = seed.gross_ceiling.clone();
    let mut apply_tolerance = true;
    let mut legs = Vec::with_capacity(edges.len());
    let mut fee_totals = BTreeMap::new();

    for &edge_index in edges {
        let edge = graph.edge(edge_index);
        if edge.from() != current.currency() {
            return Ok(None);
        }

        let fill = match edge.side() {
            OrderSide::Buy => {
                // The first leg may expand into the tolerance headroom; later
                // legs must fit what the previous leg delivered.
                let ceiling = if apply_tolerance {
                    remaining_budget.clone()
                } else {
                    current.clone()
                };
                fill_buy(edge, &ceiling)?
            }
            OrderSide::Sell => {
                let budget = apply_tolerance.then(|| remaining_budget.clone());
                fill_sell(edge, &current, budget.as_ref(), apply_tolerance)?
            }
        };
        let Some(fill) = fill else {
            return Ok(None);
        };

        // An emitted leg must spend inside the window it was resolved
        // against: the gross base range on a buy edge, the quote range on a
        // sell edge. A fee or an inverse-rate round trip that lands outside
        // makes the candidate infeasible.
        if !edge.spend_capacity().contains(&fill.spent) {
            return Ok(None);
        }

        if fill.spent.currency() == remaining_budget.currency() {
            remaining_budget = remaining_budget
                .sub_floor_zero(&fill.spent)
                .expect("budget and spend share the source currency");
        }

        let mut leg_fees = BTreeMap::new();
        for fee in fill.fees.components() {
            accumulate_fee(&mut leg_fees, fee);
            accumulate_fee(&mut fee_totals, fee);
        }
        legs.push(PathLeg::new(
            edge.from().clone(),
            edge.to().clone(),
            fill.spent.clone(),
            fill.received.clone(),
            leg_fees,
        ));

        current = fill.received;
        apply_tolerance = false;
    }

    if current.currency() != target {
        return Ok(None);
    }

    // The total outlay is the sum of leg spends in the source currency;
    // intermediate-currency spends are internal to the chain.
    let mut total_spent = Money::zero(source.clone(), seed.net.scale());
    for leg in &legs {
        if leg.spent().currency() == &source {
            total_spent = total_spent
                .add(leg.spent())
                .expect("summands share the source currency");
        }
    }

    Ok(Some(FillOutcome {
        total_spent,
        total_received: current,
        legs,
        fee_totals,
    }))
}

/// Resolves a buy leg: the largest net base in bounds whose gross spend fits
/// the ceiling. Shrinks multiplicatively toward the ceiling when fees push
/// the gross over it.
fn fill_buy(edge: &OrderEdge, ceiling: &Money) -> Result<Option<LegFill>, PrecisionViolation> {
    debug_assert_eq!(ceiling.currency(), edge.from());
    let bounds = edge.base_capacity();
    let working = working_scale(&[ceiling.scale(), edge.rate().scale(), bounds.max().scale()]);

    let mut net = clamp_to(bounds, &min_of(bounds.max(), ceiling));
    for _ in 0..BUY_REFINE_ITERATIONS {
        let quote = edge
            .rate()
            .convert(&net, working)
            .expect("a buy leg spends the order's base currency");
        let fees = edge.fee_breakdown(&net, &quote);
        let gross = match fees.base_fee() {
            Some(surcharge) => net
                .add(surcharge)
                .expect("base fee is denominated in the base currency"),
            None => net.clone(),
        };

        if gross.amount() <= ceiling.amount() {
            let received = match fees.quote_fee() {
                Some(fee) => quote
                    .sub(fee)
                    .expect("quote fee is denominated in the quote currency"),
                None => quote,
            };
            if !received.is_positive() {
                return Ok(None);
            }
            return Ok(Some(LegFill {
                spent: gross,
                received,
                fees,
            }));
        }

        let shrink = ceiling
            .amount()
            .div_guarded(gross.amount(), working, RATIO_GUARD_DIGITS)?;
        let mut candidate = net.mul(&shrink, working);
        if let Some(surcharge) = fees.base_fee() {
            // The surcharge is flat in every policy shape, so the exact
            // landing point is the ceiling minus the surcharge; the ratio
            // alone would creep toward it without reaching.
            let capped = ceiling
                .sub(surcharge)
                .expect("base fee is denominated in the base currency");
            candidate = min_of(&candidate, &capped);
        }
        let next = clamp_to(bounds, &candidate);
        if next.amount() == net.amount() {
            // Pinned at the minimum fill and still over the ceiling.
            return Ok(None);
        }
        net = next;
    }
    Ok(None)
}

/// Resolves a sell leg: the base amount whose quote-side price matches what
/// the previous leg delivered. The candidate starts from the inverted rate
/// and is tightened multiplicatively; the first leg may settle on an order
/// bound instead, leaving the tolerance window to judge the deviation.
fn fill_sell(
    edge: &OrderEdge,
    current: &Money,
    budget: Option<&Money>,
    first_leg: bool,
) -> Result<Option<LegFill>, PrecisionViolation> {
    debug_assert_eq!(current.currency(), edge.from());
    if !current.is_positive() {
        return Ok(None);
    }

    let bounds = edge.base_capacity();
    let inverse = edge.inverse_rate();
    let working = working_scale(&[current.scale(), inverse.scale(), bounds.max().scale()]);
    let tolerance = quote_match_tolerance();

    let mut base = clamp_to(
        bounds,
        &inverse
            .convert(current, working)
            .expect("a sell leg spends the order's quote currency"),
    );
    for _ in 0..SELL_REFINE_ITERATIONS {
        // The quote the order demands for `base`, via the inverse rate so the
        // round trip is exact when the candidate was not clamped.
        let quote_amount =
            base.amount()
                .div_guarded(inverse.value(), working, QUOTE_MATCH_GUARD_DIGITS)?;
        let quote = Money::new(current.currency().clone(), quote_amount);
        let fees = edge.fee_breakdown(&base, &quote);
        let gross = match fees.quote_fee() {
            Some(fee) => quote
                .add(fee)
                .expect("quote fee is denominated in the quote currency"),
            None => quote.clone(),
        };
        let within_budget = budget.map_or(true, |cap| gross.amount() <= cap.amount());

        let deviation = (quote.amount() - current.amount()).abs().div_guarded(
            current.amount(),
            working,
            QUOTE_MATCH_GUARD_DIGITS,
        )?;
        let matched = deviation <= tolerance;

        // A first leg pinned by the order bounds may deviate from the
        // requested spend; the tolerance window is the final arbiter.
        let accept =
            within_budget && (matched || (first_leg && at_bound(bounds, &base)));
        if accept {
            let received = match fees.base_fee() {
                Some(fee) => base
                    .sub(fee)
                    .expect("base fee is denominated in the base currency"),
                None => base.clone(),
            };
            if !received.is_positive() {
                return Ok(None);
            }
            return Ok(Some(LegFill {
                spent: gross,
                received,
                fees,
            }));
        }

        if quote.is_zero() {
            return Ok(None);
        }
        let steer = current
            .amount()
            .div_guarded(quote.amount(), working, RATIO_GUARD_DIGITS)?;
        let next = clamp_to(bounds, &base.mul(&steer, working));
        if next.amount() == base.amount() {
            // Pinned by the bounds and still unmatched.
            return Ok(None);
        }
        base = next;
    }
    Ok(None)
}

fn accumulate_fee(totals: &mut BTreeMap<Currency, Money>, fee: &Money) {
    match totals.get(fee.currency()) {
        Some(total) => {
            let sum = total
                .add(fee)
                .expect("fee totals are keyed by their currency");
            totals.insert(fee.currency().clone(), sum);
        }
        None => {
            totals.insert(fee.currency().clone(), fee.clone());
        }
    }
}

fn clamp_to(bounds: &CapacityRange, candidate: &Money) -> Money {
    if candidate.amount() < bounds.min().amount() {
        bounds.min().clone()
    } else if candidate.amount() > bounds.max().amount() {
        bounds.max().clone()
    } else {
        candidate.clone()
    }
}

fn at_bound(bounds: &CapacityRange, amount: &Money) -> bool {
    amount.amount() == bounds.min().amount() || amount.amount() == bounds.max().amount()
}

fn min_of(a: &Money, b: &Money) -> Money {
    if a.amount() <= b.amount() {
        a.clone()
    } else {
        b.clone()
    }
}

fn working_scale(scales: &[u32]) -> u32 {
    scales
        .iter()
        .copied()
        .fold(CANONICAL_SCALE, u32::max)
        .min(MAX_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::FeePolicy;
    use crate::test::prelude::*;

    fn graph_of(orders: Vec<crate::orderbook::Order>) -> OrderGraph {
        OrderGraph::from_orders(orders)
    }

    fn edges_from(graph: &OrderGraph, route: &[&str]) -> Vec<EdgeIndex> {
        route
            .windows(2)
            .map(|hop| {
                let from = graph.node(&currency(hop[0])).unwrap();
                graph
                    .outgoing(from)
                    .into_iter()
                    .find(|(_, to, _)| graph.currency(*to) == &currency(hop[1]))
                    .map(|(edge, _, _)| edge)
                    .unwrap()
            })
            .collect()
    }

    fn seed(currency_symbol: &str, net: &str, ceiling: &str) -> FillSeed {
        FillSeed::new(
            money(currency_symbol, net),
            money(currency_symbol, ceiling),
        )
    }

    #[test]
    fn materializes_a_two_leg_bridge_exactly() {
        let graph = graph_of(vec![
            order!(sell "USD"/"EUR" ["10.000", "200.000"] @ "0.900"),
            order!(buy "USD"/"JPY" ["50.000", "200.000"] @ "150.000"),
        ]);
        let edges = edges_from(&graph, &["EUR", "USD", "JPY"]);

        let outcome = materialize(
            &graph,
            &edges,
            &seed("EUR", "100.00", "125.00"),
            &currency("JPY"),
        )
        .unwrap()
        .unwrap();

        assert_eq!(outcome.total_spent, money("EUR", "100"));
        assert_eq!(outcome.total_received, money("JPY", "16665"));
        assert_eq!(outcome.legs.len(), 2);
        assert_eq!(outcome.legs[0].spent(), &money("EUR", "100"));
        assert_eq!(outcome.legs[0].received(), &money("USD", "111.100"));
        assert_eq!(outcome.legs[1].spent(), &money("USD", "111.100"));
        assert_eq!(outcome.legs[1].received(), &money("JPY", "16665"));
        assert!(outcome.fee_totals.is_empty());
    }

    #[test]
    fn quote_fee_reduces_the_received_amount() {
        let fee = FeePolicy::quote_percentage(dec("0.10")).unwrap();
        let graph = graph_of(vec![
            order!(buy "BTC"/"USD" ["0.100", "1.000"] @ "30000", fee),
        ]);
        let edges = edges_from(&graph, &["BTC", "USD"]);

        let outcome = materialize(
            &graph,
            &edges,
            &seed("BTC", "0.500", "0.500"),
            &currency("USD"),
        )
        .unwrap()
        .unwrap();

        assert_eq!(outcome.total_spent, money("BTC", "0.500"));
        assert_eq!(outcome.total_received, money("USD", "13500"));
        assert_eq!(
            outcome.fee_totals.get(&currency("USD")),
            Some(&money("USD", "1500"))
        );
        assert_eq!(outcome.legs[0].fees().len(), 1);
    }

    #[test]
    fn base_fee_shrinks_the_fill_to_the_ceiling() {
        // A flat base fee of 10 pushes a full-ceiling fill over budget; the
        // leg must settle on net = ceiling - fee.
        let fee = FeePolicy::flat_base(dec("10.000")).unwrap();
        let graph = graph_of(vec![
            order!(buy "USD"/"JPY" ["10.000", "500.000"] @ "150.000", fee),
        ]);
        let edges = edges_from(&graph, &["USD", "JPY"]);

        let outcome = materialize(
            &graph,
            &edges,
            &seed("USD", "100.000", "100.000"),
            &currency("JPY"),
        )
        .unwrap()
        .unwrap();

        // Gross spend fits the ceiling and includes the surcharge.
        assert!(outcome.total_spent.amount() <= &dec("100.000"));
        let net_base = outcome.legs[0]
            .spent()
            .sub(&money("USD", "10.000"))
            .unwrap();
        assert_eq!(
            outcome.legs[0].fees().get(&currency("USD")),
            Some(&money("USD", "10.000"))
        );
        // Received is the net base converted at the rate.
        assert_eq!(
            outcome.total_received.amount(),
            &net_base.amount().mul(&dec("150"), 18)
        );
    }

    #[test]
    fn buy_leg_fails_when_even_the_minimum_exceeds_the_ceiling() {
        let graph = graph_of(vec![
            order!(buy "USD"/"JPY" ["50.000", "200.000"] @ "150.000"),
        ]);
        let edges = edges_from(&graph, &["USD", "JPY"]);

        let outcome = materialize(
            &graph,
            &edges,
            &seed("USD", "10.000", "10.000"),
            &currency("JPY"),
        )
        .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn sell_leg_fails_midway_when_the_order_cannot_absorb_the_amount() {
        // Second leg can absorb at most 50 * 1/0.5 = 100 quote; the first
        // leg delivers 200.
        let graph = graph_of(vec![
            order!(buy "EUR"/"USD" ["200.000", "200.000"] @ "1.000"),
            order!(sell "GBP"/"USD" ["10.000", "50.000"] @ "2.000"),
        ]);
        let edges = edges_from(&graph, &["EUR", "USD", "GBP"]);

        let outcome = materialize(
            &graph,
            &edges,
            &seed("EUR", "200.000", "200.000"),
            &currency("GBP"),
        )
        .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn first_sell_leg_pinned_at_the_minimum_is_accepted_within_budget() {
        // The order's minimum fill costs 10 * 0.9 = 9 quote; the caller only
        // wants to spend 5 but the ceiling of 12 admits the minimum.
        let graph = graph_of(vec![
            order!(sell "USD"/"EUR" ["10.000", "200.000"] @ "0.900"),
        ]);
        let edges = edges_from(&graph, &["EUR", "USD"]);

        let outcome = materialize(
            &graph,
            &edges,
            &seed("EUR", "5.000", "12.000"),
            &currency("USD"),
        )
        .unwrap()
        .unwrap();

        assert_eq!(outcome.legs[0].received(), &money("USD", "10.000"));
        // The quote is derived through the inverted rate, so the spend is the
        // round trip of the minimum fill rather than a clean 9.
        assert_eq!(
            outcome.total_spent,
            money("EUR", "9.000900090009000900")
        );
    }

    #[test]
    fn sell_leg_spending_outside_the_quote_window_is_infeasible() {
        // A 10% quote fee on a full fill pushes the gross spend of 198 over
        // the order's quote window max of 180, even though the budget of 198
        // would admit it.
        let fee = FeePolicy::quote_percentage(dec("0.10")).unwrap();
        let graph = graph_of(vec![
            order!(sell "USD"/"EUR" ["10.000", "200.000"] @ "0.900", fee),
        ]);
        let edges = edges_from(&graph, &["EUR", "USD"]);

        let outcome = materialize(
            &graph,
            &edges,
            &seed("EUR", "180.000", "198.000"),
            &currency("USD"),
        )
        .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn mid_chain_currency_mismatch_is_infeasible() {
        let graph = graph_of(vec![
            order!(buy "EUR"/"USD" ["1.000", "100.000"] @ "1.000"),
            order!(buy "GBP"/"JPY" ["1.000", "100.000"] @ "180.000"),
        ]);
        let eur = graph.node(&currency("EUR")).unwrap();
        let gbp = graph.node(&currency("GBP")).unwrap();
        let eur_edge = graph.outgoing(eur)[0].0;
        let gbp_edge = graph.outgoing(gbp)[0].0;

        let outcome = materialize(
            &graph,
            &[eur_edge, gbp_edge],
            &seed("EUR", "50.000", "50.000"),
            &currency("JPY"),
        )
        .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn wrong_terminal_currency_is_infeasible() {
        let graph = graph_of(vec![
            order!(buy "EUR"/"USD" ["1.000", "100.000"] @ "1.000"),
        ]);
        let edges = edges_from(&graph, &["EUR", "USD"]);

        let outcome = materialize(
            &graph,
            &edges,
            &seed("EUR", "50.000", "50.000"),
            &currency("JPY"),
        )
        .unwrap();
        assert!(outcome.is_none());
    }
}
