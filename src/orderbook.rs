//! The validated order model the search graph is built from.
//!
//! An order is a standing offer on an asset pair with base-denominated fill
//! bounds, an effective exchange rate and an optional fee schedule. The taker
//! of a BUY order spends base and receives quote; the taker of a SELL order
//! spends quote and receives base. Every structural invariant is enforced at
//! construction so the graph builder and the search can rely on them.

mod fee;

pub use self::fee::{FeeBreakdown, FeePolicy};
use crate::error::InvalidInput;
use crate::money::{Currency, ExchangeRate, Money};
use std::fmt;

/// Which side of the pair the order's maker is on, which in turn fixes the
/// direction a taker trades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("BUY"),
            OrderSide::Sell => f.write_str("SELL"),
        }
    }
}

/// A traded pair of distinct currencies.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetPair {
    base: Currency,
    quote: Currency,
}

impl AssetPair {
    /// Creates a pair, rejecting the degenerate case where both sides name
    /// the same currency. This keeps self-loop edges unrepresentable in the
    /// search graph.
    pub fn new(base: Currency, quote: Currency) -> Result<Self, InvalidInput> {
        if base == quote {
            return Err(InvalidInput::DegeneratePair(base));
        }
        Ok(AssetPair { base, quote })
    }

    pub fn base(&self) -> &Currency {
        &self.base
    }

    pub fn quote(&self) -> &Currency {
        &self.quote
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A single limit-style order with bounded fillable amounts.
#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    side: OrderSide,
    pair: AssetPair,
    min_base: Money,
    max_base: Money,
    rate: ExchangeRate,
    fee: Option<FeePolicy>,
}

impl Order {
    /// Builds an order, checking the cross-field invariants:
    /// the bounds are base-denominated and not inverted, and the effective
    /// rate quotes the pair's base in the pair's quote.
    pub fn new(
        side: OrderSide,
        pair: AssetPair,
        min_base: Money,
        max_base: Money,
        rate: ExchangeRate,
        fee: Option<FeePolicy>,
    ) -> Result<Self, InvalidInput> {
        for bound in [&min_base, &max_base] {
            if bound.currency() != pair.base() {
                return Err(InvalidInput::CurrencyMismatch {
                    expected: pair.base().clone(),
                    actual: bound.currency().clone(),
                });
            }
        }
        if rate.base() != pair.base() || rate.quote() != pair.quote() {
            return Err(InvalidInput::CurrencyMismatch {
                expected: pair.base().clone(),
                actual: rate.base().clone(),
            });
        }
        if min_base.is_negative() || min_base.amount() > max_base.amount() {
            return Err(InvalidInput::InvalidBounds {
                min: min_base,
                max: max_base,
            });
        }
        Ok(Order {
            side,
            pair,
            min_base,
            max_base,
            rate,
            fee,
        })
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn pair(&self) -> &AssetPair {
        &self.pair
    }

    /// The smallest fillable base amount.
    pub fn min_base(&self) -> &Money {
        &self.min_base
    }

    /// The largest fillable base amount.
    pub fn max_base(&self) -> &Money {
        &self.max_base
    }

    pub fn rate(&self) -> &ExchangeRate {
        &self.rate
    }

    pub fn fee(&self) -> Option<&FeePolicy> {
        self.fee.as_ref()
    }

    /// The currency a taker must supply to fill this order.
    pub fn taker_spends(&self) -> &Currency {
        match self.side {
            OrderSide::Buy => self.pair.base(),
            OrderSide::Sell => self.pair.quote(),
        }
    }

    /// The currency a taker receives from filling this order.
    pub fn taker_receives(&self) -> &Currency {
        match self.side {
            OrderSide::Buy => self.pair.quote(),
            OrderSide::Sell => self.pair.base(),
        }
    }
}
