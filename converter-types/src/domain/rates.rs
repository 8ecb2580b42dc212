//! Results returned by rate providers.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{CurrencyCode, DateRange};

/// Latest rates relative to a base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestRatesResult {
    pub base_currency: CurrencyCode,
    pub as_of: NaiveDate,
    pub rates: HashMap<CurrencyCode, Decimal>,
}

/// Outcome of a single live conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionProviderResult {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: Decimal,
    pub converted_amount: Decimal,
    pub rate_used: Decimal,
    pub as_of: NaiveDate,
}

impl ConversionProviderResult {
    /// Builds a result, deriving the rate from the converted amount.
    ///
    /// A zero amount yields a zero rate instead of dividing by zero.
    pub fn from_converted(
        from: CurrencyCode,
        to: CurrencyCode,
        amount: Decimal,
        converted_amount: Decimal,
        as_of: NaiveDate,
    ) -> Self {
        let rate_used = if amount.is_zero() {
            Decimal::ZERO
        } else {
            converted_amount / amount
        };

        Self {
            from,
            to,
            amount,
            converted_amount,
            rate_used,
            as_of,
        }
    }
}

/// Rates for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRatePoint {
    pub date: NaiveDate,
    pub rates: HashMap<CurrencyCode, Decimal>,
}

/// A time series of rates. Point order is whatever the provider returned.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRatesResult {
    pub base_currency: CurrencyCode,
    pub range: DateRange,
    pub points: Vec<HistoricalRatePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(raw: &str) -> CurrencyCode {
        CurrencyCode::new(raw).unwrap()
    }

    #[test]
    fn test_rate_is_converted_over_amount() {
        let result = ConversionProviderResult::from_converted(
            code("USD"),
            code("EUR"),
            dec!(100),
            dec!(85.50),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        );
        assert_eq!(result.rate_used, dec!(0.8550));
    }

    #[test]
    fn test_zero_amount_yields_zero_rate() {
        let result = ConversionProviderResult::from_converted(
            code("USD"),
            code("EUR"),
            Decimal::ZERO,
            dec!(85.50),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        );
        assert_eq!(result.rate_used, Decimal::ZERO);
    }
}
