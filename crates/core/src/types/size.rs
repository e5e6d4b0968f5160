//! Shoe sizes and sizing systems.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product size as chosen on the product page.
///
/// Sizes are either free-form labels (`"M"`, `"42 2/3"`) or numbers (`42`,
/// `9.5`). The two never compare equal: `Text("42")` and `Number(42)` are
/// different sizes, matching how they were selected in the catalog. Numeric
/// sizes compare by value, so `9.5` and `9.50` are the same size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Size {
    /// A text label.
    Text(String),
    /// A numeric size, serialized as a JSON number.
    Number(#[serde(with = "rust_decimal::serde::float")] Decimal),
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(label) => f.write_str(label),
            Self::Number(n) => write!(f, "{}", n.normalize()),
        }
    }
}

impl From<&str> for Size {
    fn from(label: &str) -> Self {
        Self::Text(label.to_owned())
    }
}

impl From<String> for Size {
    fn from(label: String) -> Self {
        Self::Text(label)
    }
}

impl From<u32> for Size {
    fn from(n: u32) -> Self {
        Self::Number(Decimal::from(n))
    }
}

impl From<Decimal> for Size {
    fn from(n: Decimal) -> Self {
        Self::Number(n)
    }
}

/// Sizing system a [`Size`] is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SizeSystem {
    #[default]
    EU,
    US,
}

impl fmt::Display for SizeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EU => f.write_str("EU"),
            Self::US => f.write_str("US"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use core::str::FromStr;

    use super::*;

    #[test]
    fn test_text_and_number_are_distinct() {
        assert_ne!(Size::from("42"), Size::from(42_u32));
    }

    #[test]
    fn test_numeric_sizes_compare_by_value() {
        let a = Size::from(Decimal::from_str("9.5").unwrap());
        let b = Size::from(Decimal::from_str("9.50").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_json_strings_stay_text() {
        let size: Size = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(size, Size::Text("42".to_string()));
    }

    #[test]
    fn test_json_numbers_become_numbers() {
        let size: Size = serde_json::from_str("42").unwrap();
        assert_eq!(size, Size::from(42_u32));

        let size: Size = serde_json::from_str("9.5").unwrap();
        assert_eq!(size, Size::from(Decimal::from_str("9.5").unwrap()));
    }

    #[test]
    fn test_number_serializes_as_json_number() {
        let json = serde_json::to_string(&Size::from(44_u32)).unwrap();
        assert_eq!(json, "44.0");
    }

    #[test]
    fn test_display() {
        assert_eq!(Size::from("M").to_string(), "M");
        assert_eq!(Size::from(Decimal::from_str("10.50").unwrap()).to_string(), "10.5");
        assert_eq!(SizeSystem::US.to_string(), "US");
    }
}
