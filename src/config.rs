//! Search configuration and its validation.
//!
//! A configuration is built from a spend amount and refined through `with_…`
//! setters; each setter checks its own invariant and fails fast with
//! [`InvalidInput`], so a constructed value is consistent by the time a
//! search sees it. The spend currency doubles as the search's source node.

use crate::decimal::Decimal;
use crate::error::InvalidInput;
use crate::money::{Currency, Money};
use std::time::Duration;

/// Default cap on queue pops per search.
pub const DEFAULT_MAX_EXPANSIONS: usize = 250_000;

/// Default cap on live states registered per search.
pub const DEFAULT_MAX_VISITED_STATES: usize = 250_000;

/// Default hop window.
const DEFAULT_MIN_HOPS: u32 = 1;
const DEFAULT_MAX_HOPS: u32 = 4;

/// A validated search configuration.
#[derive(Clone, Debug)]
pub struct PathSearchConfig {
    spend: Money,
    min_tolerance: Decimal,
    max_tolerance: Decimal,
    min_hops: u32,
    max_hops: u32,
    result_limit: usize,
    max_expansions: usize,
    max_visited_states: usize,
    time_budget: Option<Duration>,
}

impl PathSearchConfig {
    /// Starts a configuration for spending `spend`, which must be strictly
    /// positive. Defaults: zero tolerance, hops `[1, 4]`, a single result,
    /// guards at 250 000 expansions and visited states, no time budget.
    pub fn new(spend: Money) -> Result<Self, InvalidInput> {
        if !spend.is_positive() {
            return Err(InvalidInput::NonPositiveSpend(spend));
        }
        Ok(PathSearchConfig {
            spend,
            min_tolerance: Decimal::zero(0),
            max_tolerance: Decimal::zero(0),
            min_hops: DEFAULT_MIN_HOPS,
            max_hops: DEFAULT_MAX_HOPS,
            result_limit: 1,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            max_visited_states: DEFAULT_MAX_VISITED_STATES,
            time_budget: None,
        })
    }

    /// Sets the acceptable deviation window around the spend amount. Both
    /// tolerances must lie in `[0, 1)`.
    pub fn with_tolerance(mut self, min: Decimal, max: Decimal) -> Result<Self, InvalidInput> {
        for tolerance in [&min, &max] {
            if tolerance.is_negative() || tolerance >= &Decimal::one(0) {
                return Err(InvalidInput::InvalidTolerance(tolerance.clone()));
            }
        }
        self.min_tolerance = min;
        self.max_tolerance = max;
        Ok(self)
    }

    /// Sets the hop window: at least one hop, and the window must not be
    /// inverted.
    pub fn with_hops(mut self, min: u32, max: u32) -> Result<Self, InvalidInput> {
        if min < 1 || max < min {
            return Err(InvalidInput::InvalidHopWindow { min, max });
        }
        self.min_hops = min;
        self.max_hops = max;
        Ok(self)
    }

    /// Sets how many ranked results to retain.
    pub fn with_result_limit(mut self, limit: usize) -> Result<Self, InvalidInput> {
        if limit < 1 {
            return Err(InvalidInput::InvalidResultLimit);
        }
        self.result_limit = limit;
        Ok(self)
    }

    /// Caps the number of queue pops before the search gives up.
    pub fn with_max_expansions(mut self, limit: usize) -> Result<Self, InvalidInput> {
        if limit < 1 {
            return Err(InvalidInput::InvalidGuardLimit);
        }
        self.max_expansions = limit;
        Ok(self)
    }

    /// Caps the number of live states before the search gives up.
    pub fn with_max_visited_states(mut self, limit: usize) -> Result<Self, InvalidInput> {
        if limit < 1 {
            return Err(InvalidInput::InvalidGuardLimit);
        }
        self.max_visited_states = limit;
        Ok(self)
    }

    /// Sets a wall-clock budget for the search.
    pub fn with_time_budget(mut self, budget: Duration) -> Result<Self, InvalidInput> {
        if budget < Duration::from_millis(1) {
            return Err(InvalidInput::InvalidTimeBudget);
        }
        self.time_budget = Some(budget);
        Ok(self)
    }

    /// The configured spend amount; its currency is the source of the search.
    pub fn spend_amount(&self) -> &Money {
        &self.spend
    }

    /// The source currency, derived from the spend amount.
    pub fn source(&self) -> &Currency {
        self.spend.currency()
    }

    pub fn min_tolerance(&self) -> &Decimal {
        &self.min_tolerance
    }

    pub fn max_tolerance(&self) -> &Decimal {
        &self.max_tolerance
    }

    pub fn min_hops(&self) -> u32 {
        self.min_hops
    }

    pub fn max_hops(&self) -> u32 {
        self.max_hops
    }

    pub fn result_limit(&self) -> usize {
        self.result_limit
    }

    pub fn max_expansions(&self) -> usize {
        self.max_expansions
    }

    pub fn max_visited_states(&self) -> usize {
        self.max_visited_states
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }

    /// The lowest acceptable total spend, at the spend amount's scale.
    pub fn min_spend(&self) -> Money {
        let factor = &Decimal::one(0) - &self.min_tolerance;
        self.spend.mul(&factor, self.spend.scale())
    }

    /// The highest acceptable total spend, at the spend amount's scale.
    pub fn max_spend(&self) -> Money {
        let factor = &Decimal::one(0) + &self.max_tolerance;
        self.spend.mul(&factor, self.spend.scale())
    }

    /// The tolerance used while seeding candidate materialization: the wider
    /// of the two window halves.
    pub fn heuristic_tolerance(&self) -> &Decimal {
        if self.min_tolerance >= self.max_tolerance {
            &self.min_tolerance
        } else {
            &self.max_tolerance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::prelude::*;

    fn base_config() -> PathSearchConfig {
        PathSearchConfig::new(money("EUR", "100.00")).unwrap()
    }

    #[test]
    fn spend_must_be_strictly_positive() {
        assert!(PathSearchConfig::new(money("EUR", "0.00")).is_err());
        assert!(PathSearchConfig::new(money("EUR", "-1.00")).is_err());
        assert!(PathSearchConfig::new(money("EUR", "0.01")).is_ok());
    }

    #[test]
    fn tolerances_must_lie_in_the_unit_interval() {
        assert!(base_config().with_tolerance(dec("0"), dec("0.25")).is_ok());
        assert!(base_config().with_tolerance(dec("-0.1"), dec("0")).is_err());
        assert!(base_config().with_tolerance(dec("0"), dec("1")).is_err());
        assert!(base_config().with_tolerance(dec("0.999"), dec("0")).is_ok());
    }

    #[test]
    fn hop_window_cannot_be_empty_or_inverted() {
        assert!(base_config().with_hops(1, 1).is_ok());
        assert!(base_config().with_hops(0, 3).is_err());
        assert!(base_config().with_hops(3, 2).is_err());
    }

    #[test]
    fn limits_must_be_at_least_one() {
        assert!(base_config().with_result_limit(0).is_err());
        assert!(base_config().with_max_expansions(0).is_err());
        assert!(base_config().with_max_visited_states(0).is_err());
        assert!(base_config().with_time_budget(Duration::ZERO).is_err());
        assert!(base_config().with_time_budget(Duration::from_millis(5)).is_ok());
    }

    #[test]
    fn spend_window_is_derived_at_the_spend_scale() {
        let config = base_config()
            .with_tolerance(dec("0.1"), dec("0.25"))
            .unwrap();
        assert_eq!(config.min_spend(), money("EUR", "90.00"));
        assert_eq!(config.max_spend(), money("EUR", "125.00"));
        assert_eq!(config.heuristic_tolerance(), &dec("0.25"));
        assert_eq!(config.source().symbol(), "EUR");
    }

    #[test]
    fn defaults_are_in_place() {
        let config = base_config();
        assert_eq!(config.min_hops(), 1);
        assert_eq!(config.max_hops(), 4);
        assert_eq!(config.result_limit(), 1);
        assert_eq!(config.max_expansions(), DEFAULT_MAX_EXPANSIONS);
        assert_eq!(config.max_visited_states(), DEFAULT_MAX_VISITED_STATES);
        assert_eq!(config.time_budget(), None);
        assert_eq!(config.min_spend(), money("EUR", "100.00"));
        assert_eq!(config.max_spend(), money("EUR", "100.00"));
    }
}
