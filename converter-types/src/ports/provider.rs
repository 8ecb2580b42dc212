//! Exchange rate provider port.
//!
//! This trait defines the interface for upstream rate sources.
//! Implementations can be HTTP clients, stub providers, etc.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::{
    ConversionProviderResult, CurrencyCode, DateRange, HistoricalRatesResult, LatestRatesResult,
};
use crate::error::ProviderError;

/// Static key selecting the active provider implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKey {
    Frankfurter,
}

impl ProviderKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKey::Frankfurter => "frankfurter",
        }
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frankfurter" => Ok(ProviderKey::Frankfurter),
            other => Err(format!("Unknown currency provider: {}", other)),
        }
    }
}

/// Port trait for exchange rate providers.
///
/// Every call may fail with [`ProviderError::Upstream`] when the upstream
/// response is empty, unparseable, or lacks the requested currency.
#[async_trait::async_trait]
pub trait RateProvider: Send + Sync {
    /// Latest rates relative to `base`.
    async fn latest_rates(&self, base: &CurrencyCode) -> Result<LatestRatesResult, ProviderError>;

    /// Converts `amount` of `from` into `to` at the latest rate.
    async fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ConversionProviderResult, ProviderError>;

    /// Daily rates relative to `base` for every business day in `range`.
    async fn historical_rates(
        &self,
        base: &CurrencyCode,
        range: DateRange,
    ) -> Result<HistoricalRatesResult, ProviderError>;
}

#[async_trait::async_trait]
impl<T: RateProvider + ?Sized> RateProvider for Arc<T> {
    async fn latest_rates(&self, base: &CurrencyCode) -> Result<LatestRatesResult, ProviderError> {
        (**self).latest_rates(base).await
    }

    async fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ConversionProviderResult, ProviderError> {
        (**self).convert(amount, from, to).await
    }

    async fn historical_rates(
        &self,
        base: &CurrencyCode,
        range: DateRange,
    ) -> Result<HistoricalRatesResult, ProviderError> {
        (**self).historical_rates(base, range).await
    }
}
