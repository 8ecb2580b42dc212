//! Frankfurter (<https://www.frankfurter.app>) rate provider.

pub mod responses;

use async_trait::async_trait;
use converter_types::{
    ConversionProviderResult, CurrencyCode, DateRange, HistoricalRatesResult, LatestRatesResult,
    ProviderError, ProviderKey, RateProvider,
};
use reqwest::Url;
use rust_decimal::Decimal;

use crate::outbound::{OutboundClient, UpstreamResponse};
use crate::resilience::{ResilienceOptions, ResiliencePipeline};
use responses::{HistoricalResponse, LatestResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app/";

#[derive(Debug, Clone, PartialEq)]
pub struct FrankfurterOptions {
    pub base_url: String,
}

impl Default for FrankfurterOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// HTTP adapter for the Frankfurter API.
///
/// All three operations go through one [`ResiliencePipeline`], so they share
/// a circuit breaker.
#[derive(Debug)]
pub struct FrankfurterProvider {
    base_url: Url,
    client: OutboundClient,
    pipeline: ResiliencePipeline,
}

impl FrankfurterProvider {
    pub fn new(options: FrankfurterOptions, resilience: ResilienceOptions) -> Result<Self, ProviderError> {
        let client = OutboundClient::with_request_timeout(resilience.timeout)?;
        Self::with_client(options, resilience, client)
    }

    pub fn with_client(
        options: FrankfurterOptions,
        resilience: ResilienceOptions,
        client: OutboundClient,
    ) -> Result<Self, ProviderError> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let mut raw = options.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).map_err(|e| {
            ProviderError::Transport(format!("Invalid Frankfurter base URL '{}': {e}", options.base_url))
        })?;

        Ok(Self {
            base_url,
            client,
            pipeline: ResiliencePipeline::new(ProviderKey::Frankfurter.as_str(), resilience),
        })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ProviderError::Transport(format!("Invalid Frankfurter path '{path}': {e}")))?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    /// GET through the resilience pipeline; non-2xx after retries is an upstream error.
    async fn fetch(&self, url: Url) -> Result<String, ProviderError> {
        let response: UpstreamResponse = self
            .pipeline
            .execute(|| self.client.get(url.clone()))
            .await?;

        if !response.status.is_success() {
            return Err(ProviderError::Upstream(format!(
                "Frankfurter returned HTTP {}",
                response.status.as_u16()
            )));
        }
        Ok(response.body)
    }
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    #[tracing::instrument(skip_all, fields(base = %base))]
    async fn latest_rates(&self, base: &CurrencyCode) -> Result<LatestRatesResult, ProviderError> {
        let url = self.endpoint("latest", &[("base", base.as_str())])?;
        let body = self.fetch(url).await?;
        responses::parse::<LatestResponse>(&body)?.into_latest()
    }

    #[tracing::instrument(skip_all, fields(%amount, from = %from, to = %to))]
    async fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ConversionProviderResult, ProviderError> {
        let amount_str = amount.to_string();
        let url = self.endpoint(
            "latest",
            &[("amount", &amount_str), ("from", from.as_str()), ("to", to.as_str())],
        )?;
        let body = self.fetch(url).await?;
        let (converted, as_of) = responses::parse::<LatestResponse>(&body)?.converted(to)?;

        Ok(ConversionProviderResult::from_converted(
            from.clone(),
            to.clone(),
            amount,
            converted,
            as_of,
        ))
    }

    #[tracing::instrument(skip_all, fields(base = %base, start = %range.start(), end = %range.end()))]
    async fn historical_rates(
        &self,
        base: &CurrencyCode,
        range: DateRange,
    ) -> Result<HistoricalRatesResult, ProviderError> {
        let path = format!(
            "{}..{}",
            range.start().format("%Y-%m-%d"),
            range.end().format("%Y-%m-%d")
        );
        let url = self.endpoint(&path, &[("base", base.as_str())])?;
        let body = self.fetch(url).await?;
        responses::parse::<HistoricalResponse>(&body)?.into_historical()
    }
}
