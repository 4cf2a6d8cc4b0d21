//! Fee schedules attached to orders.
//!
//! A fee policy maps a prospective fill `(side, base, quote)` to the fees it
//! incurs, split by currency. Base fees add to the taker's gross spend on the
//! base side; quote fees subtract from what the taker receives on the quote
//! side (or add to the gross quote a sell-side taker hands over).

use crate::decimal::{saturating_scale, Decimal};
use crate::error::InvalidInput;
use crate::money::Money;
use crate::orderbook::OrderSide;

/// The fees a single fill incurs, split by side of the pair. Either component
/// may be absent.
#[derive(Clone, Debug, PartialEq)]
pub struct FeeBreakdown {
    base_fee: Option<Money>,
    quote_fee: Option<Money>,
}

impl FeeBreakdown {
    /// A breakdown with no fees at all.
    pub fn none() -> Self {
        FeeBreakdown {
            base_fee: None,
            quote_fee: None,
        }
    }

    pub fn base_fee(&self) -> Option<&Money> {
        self.base_fee.as_ref()
    }

    pub fn quote_fee(&self) -> Option<&Money> {
        self.quote_fee.as_ref()
    }

    /// Iterates over the present fee components.
    pub fn components(&self) -> impl Iterator<Item = &Money> + '_ {
        self.base_fee.iter().chain(self.quote_fee.iter())
    }
}

/// A fee schedule. Policies are a closed set of shapes rather than open
/// dispatch; the engine evaluates one per leg.
#[derive(Clone, Debug, PartialEq)]
pub enum FeePolicy {
    /// A percentage of the quote amount, e.g. `0.10` for 10%.
    QuotePercentage { rate: Decimal },
    /// A flat surcharge in the base currency.
    FlatBase { amount: Decimal },
    /// Both of the above combined.
    Combined {
        base_amount: Decimal,
        quote_rate: Decimal,
    },
}

impl FeePolicy {
    pub fn quote_percentage(rate: Decimal) -> Result<Self, InvalidInput> {
        validate_rate(&rate)?;
        Ok(FeePolicy::QuotePercentage { rate })
    }

    pub fn flat_base(amount: Decimal) -> Result<Self, InvalidInput> {
        validate_flat(&amount)?;
        Ok(FeePolicy::FlatBase { amount })
    }

    pub fn combined(base_amount: Decimal, quote_rate: Decimal) -> Result<Self, InvalidInput> {
        validate_flat(&base_amount)?;
        validate_rate(&quote_rate)?;
        Ok(FeePolicy::Combined {
            base_amount,
            quote_rate,
        })
    }

    /// Evaluates the fees for a prospective fill of `base` against `quote`.
    /// The side is part of the interface contract; the shapes defined here
    /// charge the same amounts on both sides.
    pub fn calculate(&self, _side: OrderSide, base: &Money, quote: &Money) -> FeeBreakdown {
        let base_fee = |amount: &Decimal| {
            let scale = base.scale().max(amount.scale());
            Money::new(base.currency().clone(), amount.rescale(scale))
        };
        let quote_fee = |rate: &Decimal| {
            let scale = saturating_scale(quote.scale() + rate.scale());
            quote.mul(rate, scale)
        };

        match self {
            FeePolicy::QuotePercentage { rate } => FeeBreakdown {
                base_fee: None,
                quote_fee: Some(quote_fee(rate)),
            },
            FeePolicy::FlatBase { amount } => FeeBreakdown {
                base_fee: Some(base_fee(amount)),
                quote_fee: None,
            },
            FeePolicy::Combined {
                base_amount,
                quote_rate,
            } => FeeBreakdown {
                base_fee: Some(base_fee(base_amount)),
                quote_fee: Some(quote_fee(quote_rate)),
            },
        }
    }
}

fn validate_rate(rate: &Decimal) -> Result<(), InvalidInput> {
    if rate.is_negative() || rate >= &Decimal::one(0) {
        return Err(InvalidInput::InvalidFee(rate.clone()));
    }
    Ok(())
}

fn validate_flat(amount: &Decimal) -> Result<(), InvalidInput> {
    if amount.is_negative() {
        return Err(InvalidInput::InvalidFee(amount.clone()));
    }
    Ok(())
}
