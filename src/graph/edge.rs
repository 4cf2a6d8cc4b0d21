//! Edges of the search graph, derived one-to-one from orders.
//!
//! An edge points in the taker direction of its order and carries three
//! capacity ranges for the same fill window measured three ways: net base,
//! net quote, and gross base (net plus any base-side fee surcharge). The
//! mandatory/optional segment list describes how much of the window must be
//! filled to use the edge at all and how much is reservable headroom.

use crate::decimal::{saturating_scale, Decimal};
use crate::money::{Currency, ExchangeRate, Money};
use crate::orderbook::{FeeBreakdown, FeePolicy, Order, OrderSide};

/// An inclusive `[min, max]` window of amounts in one currency.
#[derive(Clone, Debug, PartialEq)]
pub struct CapacityRange {
    min: Money,
    max: Money,
}

impl CapacityRange {
    fn new(min: Money, max: Money) -> Self {
        debug_assert_eq!(min.currency(), max.currency());
        debug_assert!(min.amount() <= max.amount());
        CapacityRange { min, max }
    }

    fn point(at: Money) -> Self {
        CapacityRange {
            min: at.clone(),
            max: at,
        }
    }

    pub fn min(&self) -> &Money {
        &self.min
    }

    pub fn max(&self) -> &Money {
        &self.max
    }

    /// Whether an amount lies inside the window.
    pub fn contains(&self, amount: &Money) -> bool {
        amount.currency() == self.min.currency()
            && self.min.amount() <= amount.amount()
            && amount.amount() <= self.max.amount()
    }
}

/// A slice of an edge's capacity. The mandatory slice is the inescapable
/// minimum fill; optional slices start at zero and cover the remaining
/// headroom up to the capacity maximum.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSegment {
    mandatory: bool,
    base: CapacityRange,
    quote: CapacityRange,
    gross_base: CapacityRange,
}

impl EdgeSegment {
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn base(&self) -> &CapacityRange {
        &self.base
    }

    pub fn quote(&self) -> &CapacityRange {
        &self.quote
    }

    pub fn gross_base(&self) -> &CapacityRange {
        &self.gross_base
    }
}

/// A directed capacity-bearing slot in the search graph, derived from one
/// order. `from` is the currency a taker spends when traversing the edge.
#[derive(Clone, Debug)]
pub struct OrderEdge {
    from: Currency,
    to: Currency,
    side: OrderSide,
    rate: ExchangeRate,
    inverse_rate: ExchangeRate,
    fee: Option<FeePolicy>,
    base: CapacityRange,
    quote: CapacityRange,
    gross_base: CapacityRange,
    segments: Vec<EdgeSegment>,
    cost_factor: Option<Decimal>,
    inverse_cost_factor: Option<Decimal>,
}

impl OrderEdge {
    /// Derives the edge for an order's taker direction.
    pub fn from_order(order: &Order) -> Self {
        let side = order.side();
        let rate = order.rate().clone();
        let (from, to) = (order.taker_spends().clone(), order.taker_receives().clone());

        let base = CapacityRange::new(order.min_base().clone(), order.max_base().clone());
        let convert_scale = saturating_scale(base.min().scale() + rate.scale());
        let quote = CapacityRange::new(
            rate.convert(base.min(), convert_scale)
                .expect("order bounds are validated base-denominated"),
            rate.convert(base.max(), convert_scale)
                .expect("order bounds are validated base-denominated"),
        );
        let gross_base = CapacityRange::new(
            gross_of(order.fee(), side, base.min(), quote.min()),
            gross_of(order.fee(), side, base.max(), quote.max()),
        );

        let segments = build_segments(&base, &quote, &gross_base);

        // Cost factor: spend-capacity max over receive-capacity max, at the
        // canonical scale. A zero receive capacity means the edge can never
        // deliver anything and carries no cost.
        let (spend_max, receive_max) = match side {
            OrderSide::Buy => (gross_base.max(), quote.max()),
            OrderSide::Sell => (quote.max(), base.max()),
        };
        let cost_factor = ratio(spend_max.amount(), receive_max.amount());
        let inverse_cost_factor = ratio(receive_max.amount(), spend_max.amount());

        OrderEdge {
            from,
            to,
            side,
            inverse_rate: rate.invert(),
            rate,
            fee: order.fee().cloned(),
            base,
            quote,
            gross_base,
            segments,
            cost_factor,
            inverse_cost_factor,
        }
    }

    pub fn from(&self) -> &Currency {
        &self.from
    }

    pub fn to(&self) -> &Currency {
        &self.to
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    /// The order's base→quote rate.
    pub fn rate(&self) -> &ExchangeRate {
        &self.rate
    }

    /// The quote→base rate used to resolve sell-side fills.
    pub fn inverse_rate(&self) -> &ExchangeRate {
        &self.inverse_rate
    }

    pub fn fee(&self) -> Option<&FeePolicy> {
        self.fee.as_ref()
    }

    /// Net fillable window in the base currency.
    pub fn base_capacity(&self) -> &CapacityRange {
        &self.base
    }

    /// Net fillable window in the quote currency.
    pub fn quote_capacity(&self) -> &CapacityRange {
        &self.quote
    }

    /// Base window including base-side fee surcharges.
    pub fn gross_base_capacity(&self) -> &CapacityRange {
        &self.gross_base
    }

    pub fn segments(&self) -> &[EdgeSegment] {
        &self.segments
    }

    /// The window measured in the currency a taker spends.
    pub fn spend_capacity(&self) -> &CapacityRange {
        match self.side {
            OrderSide::Buy => &self.gross_base,
            OrderSide::Sell => &self.quote,
        }
    }

    /// The window measured in the currency a taker receives.
    pub fn receive_capacity(&self) -> &CapacityRange {
        match self.side {
            OrderSide::Buy => &self.quote,
            OrderSide::Sell => &self.base,
        }
    }

    /// The dimensionless cost of taking this edge: spend max over receive
    /// max. `None` when the edge can never deliver.
    pub fn cost_factor(&self) -> Option<&Decimal> {
        self.cost_factor.as_ref()
    }

    /// The reciprocal of the cost factor, accumulated into the product rate.
    pub fn inverse_cost_factor(&self) -> Option<&Decimal> {
        self.inverse_cost_factor.as_ref()
    }

    /// Evaluates the fee schedule for a prospective fill, or no fees when the
    /// order carries no schedule.
    pub fn fee_breakdown(&self, base: &Money, quote: &Money) -> FeeBreakdown {
        match &self.fee {
            Some(policy) => policy.calculate(self.side, base, quote),
            None => FeeBreakdown::none(),
        }
    }
}

/// Base amount plus any base-side fee at that fill level.
fn gross_of(fee: Option<&FeePolicy>, side: OrderSide, base: &Money, quote: &Money) -> Money {
    match fee {
        Some(policy) => match policy.calculate(side, base, quote).base_fee() {
            Some(surcharge) => base
                .add(surcharge)
                .expect("base fee is denominated in the base currency"),
            None => base.clone(),
        },
        None => base.clone(),
    }
}

/// Splits a capacity window into its mandatory minimum fill and the optional
/// headroom above it. Zero-capacity slices are pruned; the mandatory segment
/// always sorts first.
fn build_segments(
    base: &CapacityRange,
    quote: &CapacityRange,
    gross_base: &CapacityRange,
) -> Vec<EdgeSegment> {
    let mut segments = Vec::with_capacity(2);

    if base.min().is_positive() {
        segments.push(EdgeSegment {
            mandatory: true,
            base: CapacityRange::point(base.min().clone()),
            quote: CapacityRange::point(quote.min().clone()),
            gross_base: CapacityRange::point(gross_base.min().clone()),
        });
    }

    let headroom = |range: &CapacityRange| {
        let size = range
            .max()
            .sub(range.min())
            .expect("capacity bounds share a currency");
        CapacityRange::new(Money::zero(size.currency().clone(), size.scale()), size)
    };
    if base.max().amount() > base.min().amount() {
        segments.push(EdgeSegment {
            mandatory: false,
            base: headroom(base),
            quote: headroom(quote),
            gross_base: headroom(gross_base),
        });
    }

    segments
}

/// `numerator / denominator` at the canonical scale, or `None` on a zero
/// denominator.
fn ratio(numerator: &Decimal, denominator: &Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator.div_canonical(denominator).ok()
}
