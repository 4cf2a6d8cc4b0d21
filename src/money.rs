//! Currency-tagged amounts and exchange rates.
//!
//! A [`Money`] is an exact [`Decimal`] tagged with the currency it denominates;
//! arithmetic between two amounts requires the tags to match and is a contract
//! error otherwise. Currencies are opaque uppercase symbols: no conversion is
//! ever implied by the type, only an [`ExchangeRate`] converts.

use crate::decimal::{saturating_scale, Decimal, RATIO_GUARD_DIGITS};
use crate::error::InvalidInput;
use std::fmt;

/// An opaque currency symbol: non-empty, uppercase ASCII letters and digits.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency(String);

impl Currency {
    /// Validates and wraps a currency symbol.
    pub fn new(symbol: &str) -> Result<Self, InvalidInput> {
        let valid = !symbol.is_empty()
            && symbol
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !valid {
            return Err(InvalidInput::MalformedCurrency(symbol.to_owned()));
        }
        Ok(Currency(symbol.to_owned()))
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A monetary amount: a decimal value in a single currency. The scale of the
/// amount is the scale of the money.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Money {
    currency: Currency,
    amount: Decimal,
}

impl Money {
    pub fn new(currency: Currency, amount: Decimal) -> Self {
        Money { currency, amount }
    }

    /// The zero amount in `currency` at the requested scale.
    pub fn zero(currency: Currency, scale: u32) -> Self {
        Money {
            currency,
            amount: Decimal::zero(scale),
        }
    }

    /// Convenience constructor parsing both parts, keeping the scale the
    /// amount text carries.
    pub fn parse(currency: &str, amount: &str) -> Result<Self, InvalidInput> {
        Ok(Money {
            currency: Currency::new(currency)?,
            amount: Decimal::parse(amount)?,
        })
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn amount(&self) -> &Decimal {
        &self.amount
    }

    pub fn scale(&self) -> u32 {
        self.amount.scale()
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.amount.is_negative()
    }

    /// Adds two amounts of the same currency; the result carries the finer of
    /// the two scales.
    pub fn add(&self, rhs: &Money) -> Result<Money, InvalidInput> {
        self.ensure_same_currency(rhs)?;
        Ok(Money {
            currency: self.currency.clone(),
            amount: &self.amount + &rhs.amount,
        })
    }

    /// Subtracts an amount of the same currency.
    pub fn sub(&self, rhs: &Money) -> Result<Money, InvalidInput> {
        self.ensure_same_currency(rhs)?;
        Ok(Money {
            currency: self.currency.clone(),
            amount: &self.amount - &rhs.amount,
        })
    }

    /// Subtracts an amount of the same currency, flooring the result at zero.
    /// Used for budget depletion, which never goes negative.
    pub fn sub_floor_zero(&self, rhs: &Money) -> Result<Money, InvalidInput> {
        let diff = self.sub(rhs)?;
        if diff.is_negative() {
            Ok(Money::zero(self.currency.clone(), diff.scale()))
        } else {
            Ok(diff)
        }
    }

    /// Scales the amount by a dimensionless factor, rounding HALF_UP at the
    /// target scale.
    pub fn mul(&self, factor: &Decimal, scale: u32) -> Money {
        Money {
            currency: self.currency.clone(),
            amount: self.amount.mul(factor, scale),
        }
    }

    /// The same amount rounded HALF_UP to the requested scale.
    pub fn rescale(&self, scale: u32) -> Money {
        Money {
            currency: self.currency.clone(),
            amount: self.amount.rescale(scale),
        }
    }

    fn ensure_same_currency(&self, rhs: &Money) -> Result<(), InvalidInput> {
        if self.currency != rhs.currency {
            return Err(InvalidInput::CurrencyMismatch {
                expected: self.currency.clone(),
                actual: rhs.currency.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.amount)
    }
}

/// A directed conversion rate: one unit of `base` is worth `value` units of
/// `quote`. The rate is strictly positive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeRate {
    base: Currency,
    quote: Currency,
    value: Decimal,
}

impl ExchangeRate {
    pub fn new(base: Currency, quote: Currency, value: Decimal) -> Result<Self, InvalidInput> {
        if base == quote {
            return Err(InvalidInput::DegeneratePair(base));
        }
        if !value.is_positive() {
            return Err(InvalidInput::NonPositiveRate(value));
        }
        Ok(ExchangeRate { base, quote, value })
    }

    pub fn base(&self) -> &Currency {
        &self.base
    }

    pub fn quote(&self) -> &Currency {
        &self.quote
    }

    pub fn value(&self) -> &Decimal {
        &self.value
    }

    pub fn scale(&self) -> u32 {
        self.value.scale()
    }

    /// The inverse rate, quoting `base` in units of `quote`.
    ///
    /// The scale is extended by the number of integer digits of the rate so a
    /// coarse rate keeps a usable reciprocal: `150.000` at scale 3 inverts at
    /// scale 6, while a sub-unit rate such as `0.900` keeps its own scale.
    pub fn invert(&self) -> ExchangeRate {
        let scale = saturating_scale(self.value.scale() + self.value.integer_digits());
        let inverse = Decimal::one(0)
            .div_guarded(&self.value, scale, RATIO_GUARD_DIGITS)
            .expect("exchange rates are validated strictly positive");
        ExchangeRate {
            base: self.quote.clone(),
            quote: self.base.clone(),
            value: inverse,
        }
    }

    /// Converts an amount of the base currency into the quote currency at the
    /// target scale. The amount must be denominated in `base`.
    pub fn convert(&self, money: &Money, target_scale: u32) -> Result<Money, InvalidInput> {
        if money.currency() != &self.base {
            return Err(InvalidInput::CurrencyMismatch {
                expected: self.base.clone(),
                actual: money.currency().clone(),
            });
        }
        Ok(Money::new(
            self.quote.clone(),
            money.amount().mul(&self.value, target_scale),
        ))
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{} @ {}", self.base, self.quote, self.value)
    }
}
