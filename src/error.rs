//! Error types surfaced by the path search core.
//!
//! Two kinds exist: contract violations (`InvalidInput`) raised eagerly from
//! constructors before any partial state is produced, and arithmetic failures
//! (`PrecisionViolation`) raised when a structural numeric guarantee cannot be
//! upheld. Guard limits are never errors; they are reported through the
//! [`GuardReport`](crate::GuardReport).

use crate::decimal::Decimal;
use crate::money::{Currency, Money};
use crate::MAX_SCALE;
use thiserror::Error;

/// A contract violation detected while constructing domain values or a search
/// configuration. No partial state is produced when one of these is returned.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InvalidInput {
    #[error("currency symbol must be a non-empty uppercase identifier, got {0:?}")]
    MalformedCurrency(String),
    #[error("cannot parse {0:?} as a decimal number")]
    MalformedDecimal(String),
    #[error("scale {0} exceeds the supported maximum of {MAX_SCALE}")]
    ScaleOutOfRange(u32),
    #[error("expected an amount in {expected}, got {actual}")]
    CurrencyMismatch { expected: Currency, actual: Currency },
    #[error("asset pair must name two distinct currencies, got {0} on both sides")]
    DegeneratePair(Currency),
    #[error("exchange rate must be strictly positive, got {0}")]
    NonPositiveRate(Decimal),
    #[error("fee parameter is out of range: {0}")]
    InvalidFee(Decimal),
    #[error("order bounds are inverted or negative: min {min}, max {max}")]
    InvalidBounds { min: Money, max: Money },
    #[error("spend amount must be strictly positive, got {0}")]
    NonPositiveSpend(Money),
    #[error("tolerance must lie in [0, 1), got {0}")]
    InvalidTolerance(Decimal),
    #[error("hop window is invalid: min {min}, max {max}")]
    InvalidHopWindow { min: u32, max: u32 },
    #[error("result limit must be at least 1")]
    InvalidResultLimit,
    #[error("guard limits must be at least 1")]
    InvalidGuardLimit,
    #[error("time budget must be at least 1ms")]
    InvalidTimeBudget,
}

/// An arithmetic invariant could not be maintained. Scoped to the affected
/// candidate during a search: the search loop swallows these, drops the
/// candidate and keeps draining the queue.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PrecisionViolation {
    #[error("division by zero on the monetary path")]
    DivisionByZero,
}
