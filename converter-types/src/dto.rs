//! Data Transfer Objects (DTOs) for requests and responses.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    ConversionProviderResult, CurrencyCode, HistoricalRatePoint, LatestRatesResult, PagedResult,
};

fn string_keyed(rates: &HashMap<CurrencyCode, Decimal>) -> HashMap<String, Decimal> {
    rates
        .iter()
        .map(|(code, rate)| (code.to_string(), *rate))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Result of converting an amount between two currencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionDto {
    /// Amount in the source currency
    #[schema(value_type = f64, example = 100)]
    pub amount: Decimal,
    #[schema(example = "USD")]
    pub from: String,
    #[schema(example = "EUR")]
    pub to: String,
    /// Amount in the target currency
    #[schema(value_type = f64, example = 85.5)]
    pub converted_amount: Decimal,
    /// Rate applied (converted amount / amount)
    #[serde(rename = "rate")]
    #[schema(value_type = f64, example = 0.855)]
    pub rate_used: Decimal,
    /// Date the rate was published
    #[serde(rename = "date")]
    #[schema(value_type = String, example = "2024-01-15")]
    pub as_of: NaiveDate,
}

impl From<ConversionProviderResult> for ConversionDto {
    fn from(result: ConversionProviderResult) -> Self {
        Self {
            amount: result.amount,
            from: result.from.to_string(),
            to: result.to.to_string(),
            converted_amount: result.converted_amount,
            rate_used: result.rate_used,
            as_of: result.as_of,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rates DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Latest rates relative to a base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestRatesDto {
    #[schema(example = "EUR")]
    pub base_currency: String,
    #[serde(rename = "date")]
    #[schema(value_type = String, example = "2024-01-15")]
    pub as_of: NaiveDate,
    #[schema(value_type = HashMap<String, f64>, example = json!({"USD": 1.1, "GBP": 0.85}))]
    pub rates: HashMap<String, Decimal>,
}

impl From<&LatestRatesResult> for LatestRatesDto {
    fn from(result: &LatestRatesResult) -> Self {
        Self {
            base_currency: result.base_currency.to_string(),
            as_of: result.as_of,
            rates: string_keyed(&result.rates),
        }
    }
}

/// Rates for a single day of a historical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoricalRatePointDto {
    #[schema(value_type = String, example = "2024-01-02")]
    pub date: NaiveDate,
    #[schema(value_type = HashMap<String, f64>)]
    pub rates: HashMap<String, Decimal>,
}

impl From<&HistoricalRatePoint> for HistoricalRatePointDto {
    fn from(point: &HistoricalRatePoint) -> Self {
        Self {
            date: point.date,
            rates: string_keyed(&point.rates),
        }
    }
}

/// One page of a historical rate series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRatesResponse {
    #[schema(example = "EUR")]
    pub base_currency: String,
    #[schema(value_type = String, example = "2024-01-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, example = "2024-01-31")]
    pub end_date: NaiveDate,
    pub rates: Vec<HistoricalRatePointDto>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 30)]
    pub page_size: u32,
    #[schema(example = 22)]
    pub total_items: usize,
    #[schema(example = 1)]
    pub total_pages: usize,
}

impl HistoricalRatesResponse {
    pub fn new(
        base_currency: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        page: PagedResult<HistoricalRatePointDto>,
    ) -> Self {
        let total_pages = page.total_pages();
        Self {
            base_currency,
            start_date,
            end_date,
            rates: page.items,
            page: page.page_number,
            page_size: page.page_size,
            total_items: page.total_items,
            total_pages,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Development token DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request for a development JWT.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DevTokenRequest {
    #[schema(example = "test-user")]
    pub client_id: String,
    #[serde(default)]
    #[schema(example = json!(["admin"]))]
    pub roles: Vec<String>,
}

/// A signed development JWT.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DevTokenResponse {
    pub token: String,
}
