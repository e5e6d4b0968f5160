//! Type-safe price representation using decimal arithmetic.
//!
//! Cart lines carry their price as the display string copied from the
//! catalog (e.g. `"$129.99"`). [`Price::parse_display`] turns that back into
//! an amount for totals. The accepted format is deliberately narrow: one
//! leading currency symbol followed by a plain decimal number. Thousands
//! separators, signs, whitespace and trailing currency codes are rejected
//! rather than guessed at, so a bad catalog string surfaces as an error
//! instead of a silently wrong total.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing or combining prices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The first character is not a supported currency symbol.
    #[error("unsupported currency symbol in price {input:?}")]
    UnknownSymbol {
        /// The rejected input.
        input: String,
    },
    /// The amount after the currency symbol is not a plain decimal number.
    #[error("malformed price amount in {input:?}")]
    Malformed {
        /// The rejected input.
        input: String,
    },
    /// Two prices in different currencies were added together.
    #[error("cannot combine {expected} and {found} prices")]
    MixedCurrency {
        /// Currency of the running total.
        expected: CurrencyCode,
        /// Currency of the offending price.
        found: CurrencyCode,
    },
    /// Decimal arithmetic overflowed.
    #[error("price arithmetic overflowed")]
    Overflow,
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Parse a display price such as `"$129.99"` or `"€89"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Does not start with a supported currency symbol
    /// - Has anything other than ASCII digits and a single `.` after the symbol
    ///
    /// # Examples
    ///
    /// ```
    /// use stride_core::{CurrencyCode, Price};
    ///
    /// let price = Price::parse_display("$129.99").unwrap();
    /// assert_eq!(price.currency_code, CurrencyCode::USD);
    /// assert_eq!(price.amount.to_string(), "129.99");
    ///
    /// assert!(Price::parse_display("129.99").is_err());    // no symbol
    /// assert!(Price::parse_display("$1,299.00").is_err()); // thousands separator
    /// assert!(Price::parse_display("$").is_err());         // no amount
    /// ```
    pub fn parse_display(input: &str) -> Result<Self, PriceError> {
        let mut chars = input.chars();
        let symbol = chars.next().ok_or(PriceError::Empty)?;
        let currency_code =
            CurrencyCode::from_symbol(symbol).ok_or_else(|| PriceError::UnknownSymbol {
                input: input.to_owned(),
            })?;

        let digits = chars.as_str();
        let malformed = || PriceError::Malformed {
            input: input.to_owned(),
        };

        let well_formed = digits.bytes().any(|b| b.is_ascii_digit())
            && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
            && digits.bytes().filter(|&b| b == b'.').count() <= 1;
        if !well_formed {
            return Err(malformed());
        }

        let amount = Decimal::from_str(digits).map_err(|_| malformed())?;
        Ok(Self::new(amount, currency_code))
    }

    /// Multiply by a line quantity.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the result does not fit in a `Decimal`.
    pub fn checked_mul(self, quantity: u32) -> Result<Self, PriceError> {
        let amount = self
            .amount
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::Overflow)?;
        Ok(Self::new(amount, self.currency_code))
    }

    /// Add two prices of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::MixedCurrency` if the currencies differ, or
    /// `PriceError::Overflow` if the sum does not fit in a `Decimal`.
    pub fn checked_add(self, other: Self) -> Result<Self, PriceError> {
        if self.currency_code != other.currency_code {
            return Err(PriceError::MixedCurrency {
                expected: self.currency_code,
                found: other.currency_code,
            });
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(PriceError::Overflow)?;
        Ok(Self::new(amount, self.currency_code))
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 codes for the currencies a display price can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for this currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    /// Resolve a leading display symbol. `$` is read as USD.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '$' => Some(Self::USD),
            '€' => Some(Self::EUR),
            '£' => Some(Self::GBP),
            _ => None,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_display_symbols() {
        assert_eq!(
            Price::parse_display("$129.99").unwrap(),
            Price::new(dec("129.99"), CurrencyCode::USD)
        );
        assert_eq!(
            Price::parse_display("€89").unwrap(),
            Price::new(dec("89"), CurrencyCode::EUR)
        );
        assert_eq!(
            Price::parse_display("£45.5").unwrap(),
            Price::new(dec("45.5"), CurrencyCode::GBP)
        );
    }

    #[test]
    fn test_every_currency_symbol_parses_back() {
        for currency in [CurrencyCode::USD, CurrencyCode::EUR, CurrencyCode::GBP] {
            let symbol = currency.symbol().chars().next().unwrap();
            assert_eq!(CurrencyCode::from_symbol(symbol), Some(currency));
        }
    }

    #[test]
    fn test_parse_display_empty() {
        assert_eq!(Price::parse_display(""), Err(PriceError::Empty));
    }

    #[test]
    fn test_parse_display_missing_symbol() {
        assert!(matches!(
            Price::parse_display("129.99"),
            Err(PriceError::UnknownSymbol { .. })
        ));
        assert!(matches!(
            Price::parse_display("USD 129.99"),
            Err(PriceError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn test_parse_display_rejects_malformed_amounts() {
        for input in ["$", "$abc", "$1,299.00", "$ 12", "$12.3.4", "$-5", "$12 ", "$$12", "$."] {
            assert!(
                matches!(
                    Price::parse_display(input),
                    Err(PriceError::Malformed { .. })
                ),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_checked_mul() {
        let price = Price::parse_display("$19.99").unwrap();
        assert_eq!(price.checked_mul(3).unwrap().amount, dec("59.97"));
        assert_eq!(price.checked_mul(0).unwrap().amount, Decimal::ZERO);
    }

    #[test]
    fn test_checked_add_mixed_currency() {
        let usd = Price::parse_display("$10").unwrap();
        let eur = Price::parse_display("€10").unwrap();
        assert_eq!(
            usd.checked_add(eur),
            Err(PriceError::MixedCurrency {
                expected: CurrencyCode::USD,
                found: CurrencyCode::EUR,
            })
        );
    }

    #[test]
    fn test_display_pads_cents() {
        let price = Price::new(dec("5"), CurrencyCode::EUR);
        assert_eq!(price.display(), "€5.00");
        assert_eq!(Price::zero(CurrencyCode::USD).to_string(), "$0.00");
    }
}
