//! Money and quantity quantization on top of decimal arithmetic.
//!
//! Every stored money value in the back-office is quantized to 2 decimal
//! places and every stored quantity to 3; raw division remainders never
//! reach a record. The two helpers here are the single rounding authority
//! for the workspace.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places for money values.
pub const MONEY_DP: u32 = 2;

/// Decimal places for quantity values.
pub const QUANTITY_DP: u32 = 3;

/// Quantize a money amount to [`MONEY_DP`] decimal places.
///
/// Midpoints round away from zero ("commercial" rounding), so 0.005
/// becomes 0.01 and -0.005 becomes -0.01.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Quantize a quantity to [`QUANTITY_DP`] decimal places.
///
/// Same midpoint rule as [`round_money`].
#[must_use]
pub fn round_quantity(quantity: Decimal) -> Decimal {
    quantity.round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// ISO 4217 currency codes.
///
/// No conversion between currencies happens anywhere in the back-office;
/// the code travels with each money-bearing record so collaborators can
/// tell amounts apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_round_money_two_places() {
        assert_eq!(round_money(dec("10.005")), dec("10.01"));
        assert_eq!(round_money(dec("10.004")), dec("10.00"));
        assert_eq!(round_money(dec("-10.005")), dec("-10.01"));
        assert_eq!(round_money(dec("3.333333")), dec("3.33"));
    }

    #[test]
    fn test_round_quantity_three_places() {
        assert_eq!(round_quantity(dec("1.0005")), dec("1.001"));
        assert_eq!(round_quantity(dec("1.0004")), dec("1.000"));
        assert_eq!(round_quantity(dec("0.1")), dec("0.1"));
    }

    #[test]
    fn test_round_is_idempotent() {
        let v = round_money(dec("7.777"));
        assert_eq!(round_money(v), v);
        let q = round_quantity(dec("2.71828"));
        assert_eq!(round_quantity(q), q);
    }

    #[test]
    fn test_currency_code_display() {
        assert_eq!(CurrencyCode::USD.to_string(), "USD");
        assert_eq!(CurrencyCode::EUR.code(), "EUR");
    }
}
