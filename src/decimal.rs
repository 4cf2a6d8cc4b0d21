//! Fixed-scale decimal arithmetic for the monetary path.
//!
//! Every amount, rate and cost in the engine is a [`Decimal`]: an
//! arbitrary-precision signed mantissa paired with an explicit non-negative
//! scale. HALF_UP is the only rounding mode. Equality and ordering are on
//! mathematical value after aligning scales, so `1.5` at scale 1 equals
//! `1.500` at scale 3.
//!
//! The mantissa is a [`bigdecimal::BigDecimal`]; this module narrows its API
//! to the operations the search is allowed to perform and pins the rounding
//! policy in one place.

use crate::error::{InvalidInput, PrecisionViolation};
use crate::{CANONICAL_SCALE, MAX_SCALE};
use bigdecimal::{BigDecimal, RoundingMode, Signed, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Extra working digits carried by ratios before publication.
pub(crate) const RATIO_GUARD_DIGITS: u32 = 4;

/// Caps a requested scale at the supported maximum.
pub(crate) fn saturating_scale(scale: u32) -> u32 {
    scale.min(MAX_SCALE)
}

/// An exact signed decimal number with an explicit scale.
///
/// The value is stored at its scale: rescaling pads with zeros or rounds
/// HALF_UP, never truncates silently.
#[derive(Clone)]
pub struct Decimal {
    value: BigDecimal,
    scale: u32,
}

impl Decimal {
    /// Creates a decimal from a raw mantissa value, rounding HALF_UP to the
    /// requested scale. Fails when the scale exceeds the supported maximum.
    pub fn new(value: BigDecimal, scale: u32) -> Result<Self, InvalidInput> {
        if scale > MAX_SCALE {
            return Err(InvalidInput::ScaleOutOfRange(scale));
        }
        Ok(Self::rounded(value, scale))
    }

    /// Creates a decimal directly from an integer mantissa and a scale, e.g.
    /// `from_mantissa(1, 6)` is `0.000001`.
    pub fn from_mantissa(mantissa: i64, scale: u32) -> Self {
        debug_assert!(scale <= MAX_SCALE);
        Self {
            value: BigDecimal::new(mantissa.into(), i64::from(scale)),
            scale,
        }
    }

    /// Parses a plain decimal string, keeping the scale the text carries.
    /// Exponent notation is rejected: amounts cross this boundary as the
    /// exact digits a caller wrote down.
    pub fn parse(input: &str) -> Result<Self, InvalidInput> {
        let malformed = || InvalidInput::MalformedDecimal(input.to_owned());
        if input.is_empty() || input.contains(['e', 'E']) {
            return Err(malformed());
        }
        let value = BigDecimal::from_str(input).map_err(|_| malformed())?;
        let scale = value.fractional_digit_count().max(0) as u32;
        if scale > MAX_SCALE {
            return Err(InvalidInput::ScaleOutOfRange(scale));
        }
        // Normalize negative exponents away so the stored scale is exact.
        Ok(Self {
            value: value.with_scale(i64::from(scale)),
            scale,
        })
    }

    /// Parses a plain decimal string and rounds HALF_UP to the given scale.
    pub fn parse_at(input: &str, scale: u32) -> Result<Self, InvalidInput> {
        if scale > MAX_SCALE {
            return Err(InvalidInput::ScaleOutOfRange(scale));
        }
        Ok(Self::parse(input)?.rescale(scale))
    }

    /// The zero value at the given scale.
    pub fn zero(scale: u32) -> Self {
        debug_assert!(scale <= MAX_SCALE);
        Self {
            value: BigDecimal::zero().with_scale(i64::from(scale)),
            scale,
        }
    }

    /// The one value at the given scale.
    pub fn one(scale: u32) -> Self {
        Self::from_mantissa(1, 0).rescale(scale)
    }

    /// The explicit scale of this value.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.value.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_negative()
    }

    /// The absolute value at the same scale.
    pub fn abs(&self) -> Self {
        Self {
            value: self.value.abs(),
            scale: self.scale,
        }
    }

    /// Returns the value at the requested scale, rounding HALF_UP when digits
    /// are dropped and padding with zeros when digits are added.
    pub fn rescale(&self, scale: u32) -> Self {
        debug_assert!(scale <= MAX_SCALE);
        Self::rounded(self.value.clone(), scale)
    }

    /// Multiplies exactly, then rounds HALF_UP to the target scale.
    pub fn mul(&self, rhs: &Self, scale: u32) -> Self {
        debug_assert!(scale <= MAX_SCALE);
        Self::rounded(&self.value * &rhs.value, scale)
    }

    /// Multiplies carrying `guard` extra working digits, then publishes at the
    /// target scale.
    pub fn mul_guarded(&self, rhs: &Self, scale: u32, guard: u32) -> Self {
        let working = saturating_scale(scale + guard);
        Self::rounded(&self.value * &rhs.value, working).rescale(scale)
    }

    /// Divides carrying `guard` extra working digits, then publishes at the
    /// target scale. A zero divisor is a precision violation, scoped by the
    /// caller to the candidate being computed.
    pub fn div_guarded(
        &self,
        rhs: &Self,
        scale: u32,
        guard: u32,
    ) -> Result<Self, PrecisionViolation> {
        if rhs.is_zero() {
            return Err(PrecisionViolation::DivisionByZero);
        }
        let working = saturating_scale(scale + guard);
        let quotient = &self.value / &rhs.value;
        Ok(Self::rounded(quotient, working).rescale(scale))
    }

    /// Divides at the canonical search scale with the standard ratio guard.
    pub fn div_canonical(&self, rhs: &Self) -> Result<Self, PrecisionViolation> {
        self.div_guarded(rhs, CANONICAL_SCALE, RATIO_GUARD_DIGITS)
    }

    /// Number of digits in the integer part of the value; zero when the
    /// magnitude is below one.
    pub(crate) fn integer_digits(&self) -> u32 {
        let truncated = self.value.with_scale_round(0, RoundingMode::Down);
        if truncated.is_zero() {
            0
        } else {
            truncated.digits() as u32
        }
    }

    fn rounded(value: BigDecimal, scale: u32) -> Self {
        Self {
            value: value.with_scale_round(i64::from(scale), RoundingMode::HalfUp),
            scale,
        }
    }
}

/// Addition is exact; the result carries the finer of the two scales.
impl Add for &Decimal {
    type Output = Decimal;

    fn add(self, rhs: &Decimal) -> Decimal {
        let scale = self.scale.max(rhs.scale);
        Decimal {
            value: (&self.value + &rhs.value).with_scale(i64::from(scale)),
            scale,
        }
    }
}

/// Subtraction is exact; the result carries the finer of the two scales.
impl Sub for &Decimal {
    type Output = Decimal;

    fn sub(self, rhs: &Decimal) -> Decimal {
        let scale = self.scale.max(rhs.scale);
        Decimal {
            value: (&self.value - &rhs.value).with_scale(i64::from(scale)),
            scale,
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Decimal({})", self.value)
    }
}
