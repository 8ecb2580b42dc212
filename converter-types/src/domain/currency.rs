//! Validated ISO 4217 currency code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Currencies that may not appear on either side of a conversion.
///
/// Only conversion enforces this list. Latest and historical rate lookups
/// accept these codes as a base currency.
const EXCLUDED: [&str; 4] = ["TRY", "PLN", "THB", "MXN"];

/// A validated, upper-cased three-letter currency code.
///
/// Equality is value-based on the normalized code, so `"eur"` and `" EUR "`
/// produce equal codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validates and normalizes a raw currency code.
    pub fn new(value: &str) -> Result<Self, DomainError> {
        if value.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "Currency code is required.".into(),
            ));
        }

        let normalized = value.trim().to_ascii_uppercase();
        if normalized.len() != 3 || !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidArgument(
                "Currency code must be a 3-letter ISO code.".into(),
            ));
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for currencies that cannot be converted from or to.
    pub fn is_excluded(&self) -> bool {
        EXCLUDED.iter().any(|code| code.eq_ignore_ascii_case(&self.0))
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_or_whitespace_is_rejected() {
        for raw in ["", " ", "\t\n"] {
            let err = CurrencyCode::new(raw).unwrap_err();
            assert!(matches!(err, DomainError::InvalidArgument(ref msg) if msg == "Currency code is required."));
        }
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        for raw in ["US", "USDT", "E", "EURO", " EU "] {
            let err = CurrencyCode::new(raw).unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidArgument(ref msg) if msg == "Currency code must be a 3-letter ISO code."),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_letters_are_rejected() {
        assert!(CurrencyCode::new("U5D").is_err());
        assert!(CurrencyCode::new("12$").is_err());
    }

    #[test]
    fn test_normalizes_case_and_whitespace() {
        assert_eq!(CurrencyCode::new("eur").unwrap().as_str(), "EUR");
        assert_eq!(CurrencyCode::new("  gbp ").unwrap().as_str(), "GBP");
        assert_eq!(CurrencyCode::new("eur").unwrap(), CurrencyCode::new("EUR").unwrap());
    }

    #[test]
    fn test_excluded_currencies_any_case() {
        for raw in ["TRY", "try", "Pln", "THB", "mxn"] {
            assert!(CurrencyCode::new(raw).unwrap().is_excluded(), "{raw}");
        }
    }

    #[test]
    fn test_other_currencies_not_excluded() {
        for raw in ["USD", "EUR", "GBP", "JPY", "CHF"] {
            assert!(!CurrencyCode::new(raw).unwrap().is_excluded(), "{raw}");
        }
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let code: CurrencyCode = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(code.to_string(), "USD");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"USD\"");
        assert!(serde_json::from_str::<CurrencyCode>("\"US\"").is_err());
    }
}
