//! Module containing test utilities and macros.

use crate::decimal::Decimal;
use crate::money::{Currency, Money};

/// Parses a currency symbol for a test fixture.
pub fn currency(symbol: &str) -> Currency {
    Currency::new(symbol).unwrap()
}

/// Parses a monetary amount for a test fixture, keeping the written scale.
pub fn money(symbol: &str, amount: &str) -> Money {
    Money::parse(symbol, amount).unwrap()
}

/// Parses a decimal for a test fixture, keeping the written scale.
pub fn dec(input: &str) -> Decimal {
    Decimal::parse(input).unwrap()
}

/// Macro for constructing validated orders using a DSL for testing purposes:
///
/// ```text
/// order!(sell "USD"/"EUR" ["10.000", "200.000"] @ "0.900")
/// order!(buy "BTC"/"USD" ["0.100", "1.000"] @ "30000", fee_policy)
/// ```
///
/// Bounds are base-denominated and the rate quotes base in quote, exactly as
/// the order constructor expects.
macro_rules! order {
    (buy $base:literal/$quote:literal [$min:literal, $max:literal] @ $rate:literal) => {
        order!(@build Buy, $base, $quote, $min, $max, $rate, ::std::option::Option::None)
    };
    (buy $base:literal/$quote:literal [$min:literal, $max:literal] @ $rate:literal, $fee:expr) => {
        order!(@build Buy, $base, $quote, $min, $max, $rate, ::std::option::Option::Some($fee))
    };
    (sell $base:literal/$quote:literal [$min:literal, $max:literal] @ $rate:literal) => {
        order!(@build Sell, $base, $quote, $min, $max, $rate, ::std::option::Option::None)
    };
    (sell $base:literal/$quote:literal [$min:literal, $max:literal] @ $rate:literal, $fee:expr) => {
        order!(@build Sell, $base, $quote, $min, $max, $rate, ::std::option::Option::Some($fee))
    };
    (@build $side:ident, $base:literal, $quote:literal, $min:literal, $max:literal, $rate:literal, $fee:expr) => {{
        let pair = $crate::orderbook::AssetPair::new(
            $crate::test::currency($base),
            $crate::test::currency($quote),
        )
        .unwrap();
        let rate = $crate::money::ExchangeRate::new(
            $crate::test::currency($base),
            $crate::test::currency($quote),
            $crate::test::dec($rate),
        )
        .unwrap();
        $crate::orderbook::Order::new(
            $crate::orderbook::OrderSide::$side,
            pair,
            $crate::test::money($base, $min),
            $crate::test::money($base, $max),
            rate,
            $fee,
        )
        .unwrap()
    }};
}

pub mod prelude {
    pub use super::{currency, dec, money};
}
