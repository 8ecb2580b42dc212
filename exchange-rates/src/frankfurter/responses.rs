//! Frankfurter JSON envelopes and their mapping to domain results.

use std::collections::HashMap;

use chrono::NaiveDate;
use converter_types::{
    CurrencyCode, DateRange, HistoricalRatePoint, HistoricalRatesResult, LatestRatesResult,
    ProviderError,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub(crate) const EMPTY_RESPONSE: &str = "Frankfurter response was empty.";
pub(crate) const MISSING_TARGET: &str =
    "Frankfurter response did not include the requested target currency.";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `latest` envelope, also returned for conversions.
#[derive(Debug, Deserialize)]
pub struct LatestResponse {
    #[serde(default)]
    pub amount: Decimal,
    pub base: String,
    pub date: String,
    #[serde(default)]
    pub rates: HashMap<String, Decimal>,
}

/// Time-series envelope keyed by date.
#[derive(Debug, Deserialize)]
pub struct HistoricalResponse {
    #[serde(default)]
    pub amount: Decimal,
    pub base: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub rates: HashMap<String, HashMap<String, Decimal>>,
}

/// Parses a body, treating an empty body or JSON `null` as an empty response.
pub fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    if body.trim().is_empty() {
        return Err(ProviderError::Upstream(EMPTY_RESPONSE.to_string()));
    }
    serde_json::from_str::<Option<T>>(body)
        .map_err(|e| ProviderError::Upstream(format!("Failed to parse Frankfurter response: {e}")))?
        .ok_or_else(|| ProviderError::Upstream(EMPTY_RESPONSE.to_string()))
}

fn parse_date(raw: &str) -> Result<NaiveDate, ProviderError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| ProviderError::Upstream(format!("Invalid date '{raw}' in Frankfurter response: {e}")))
}

fn parse_code(raw: &str) -> Result<CurrencyCode, ProviderError> {
    CurrencyCode::new(raw)
        .map_err(|e| ProviderError::Upstream(format!("Invalid currency '{raw}' in Frankfurter response: {e}")))
}

fn parse_rates(raw: HashMap<String, Decimal>) -> Result<HashMap<CurrencyCode, Decimal>, ProviderError> {
    raw.into_iter()
        .map(|(code, rate)| Ok((parse_code(&code)?, rate)))
        .collect()
}

impl LatestResponse {
    pub fn into_latest(self) -> Result<LatestRatesResult, ProviderError> {
        Ok(LatestRatesResult {
            base_currency: parse_code(&self.base)?,
            as_of: parse_date(&self.date)?,
            rates: parse_rates(self.rates)?,
        })
    }

    /// Converted amount for `to`, with the quote date.
    pub fn converted(&self, to: &CurrencyCode) -> Result<(Decimal, NaiveDate), ProviderError> {
        let converted = self
            .rates
            .get(to.as_str())
            .copied()
            .ok_or_else(|| ProviderError::Upstream(MISSING_TARGET.to_string()))?;
        Ok((converted, parse_date(&self.date)?))
    }
}

impl HistoricalResponse {
    pub fn into_historical(self) -> Result<HistoricalRatesResult, ProviderError> {
        let range = DateRange::create(parse_date(&self.start_date)?, parse_date(&self.end_date)?)
            .map_err(|e| ProviderError::Upstream(e.to_string()))?;

        let points = self
            .rates
            .into_iter()
            .map(|(date, rates)| {
                Ok(HistoricalRatePoint {
                    date: parse_date(&date)?,
                    rates: parse_rates(rates)?,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;

        Ok(HistoricalRatesResult {
            base_currency: parse_code(&self.base)?,
            range,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(raw: &str) -> CurrencyCode {
        CurrencyCode::new(raw).unwrap()
    }

    #[test]
    fn test_parse_latest() {
        let body = r#"{"amount":1.0,"base":"EUR","date":"2024-01-15","rates":{"USD":1.0945,"GBP":0.8601}}"#;
        let result = parse::<LatestResponse>(body).unwrap().into_latest().unwrap();

        assert_eq!(result.base_currency, code("EUR"));
        assert_eq!(result.as_of, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(result.rates.len(), 2);
        assert_eq!(result.rates[&code("USD")], dec!(1.0945));
    }

    #[test]
    fn test_empty_and_null_bodies_are_empty_responses() {
        for body in ["", "   ", "null"] {
            let err = parse::<LatestResponse>(body).unwrap_err();
            assert!(matches!(err, ProviderError::Upstream(ref m) if m == EMPTY_RESPONSE), "{body:?}");
        }
    }

    #[test]
    fn test_malformed_json_is_upstream_error() {
        let err = parse::<LatestResponse>("{not json").unwrap_err();
        assert!(matches!(err, ProviderError::Upstream(_)));
    }

    #[test]
    fn test_bad_date_is_upstream_error() {
        let body = r#"{"amount":1,"base":"EUR","date":"15/01/2024","rates":{}}"#;
        let err = parse::<LatestResponse>(body).unwrap().into_latest().unwrap_err();
        assert!(matches!(err, ProviderError::Upstream(_)));
    }

    #[test]
    fn test_converted_amount_for_target() {
        let body = r#"{"amount":100.0,"base":"USD","date":"2024-01-15","rates":{"EUR":85.5}}"#;
        let response = parse::<LatestResponse>(body).unwrap();

        let (converted, date) = response.converted(&code("EUR")).unwrap();
        assert_eq!(converted, dec!(85.5));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let err = response.converted(&code("GBP")).unwrap_err();
        assert!(matches!(err, ProviderError::Upstream(ref m) if m == MISSING_TARGET));
    }

    #[test]
    fn test_parse_historical() {
        let body = r#"{
            "amount": 1.0,
            "base": "EUR",
            "start_date": "2024-01-02",
            "end_date": "2024-01-04",
            "rates": {
                "2024-01-04": {"USD": 1.0953},
                "2024-01-02": {"USD": 1.0956},
                "2024-01-03": {"USD": 1.0919}
            }
        }"#;
        let result = parse::<HistoricalResponse>(body)
            .unwrap()
            .into_historical()
            .unwrap();

        assert_eq!(result.base_currency, code("EUR"));
        assert_eq!(result.range.start(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(result.range.end(), NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(result.points.len(), 3);

        let jan3 = result
            .points
            .iter()
            .find(|p| p.date == NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
            .unwrap();
        assert_eq!(jan3.rates[&code("USD")], dec!(1.0919));
    }
}
