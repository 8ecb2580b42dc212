//! Currency Application Services
//!
//! Orchestrate validation, caching and the rate provider port.
//! Contain NO infrastructure logic - pure business orchestration.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use converter_types::{
    AppError, ConversionDto, ConversionRequest, CurrencyCode, DateRange, HistoricalRatePoint,
    HistoricalRatePointDto, HistoricalRatesResponse, HistoricalRatesResult, LatestRatesDto,
    LatestRatesResult, PageRequest, PagedResult, RateCache, RateCacheExt, RateProvider,
};

/// TTL for `latest:<BASE>` entries.
pub const LATEST_TTL: Duration = Duration::from_secs(5 * 60);
/// TTL for `historical:<BASE>:<start>:<end>` entries.
pub const HISTORICAL_TTL: Duration = Duration::from_secs(30 * 60);

pub fn latest_key(base: &CurrencyCode) -> String {
    format!("latest:{base}")
}

pub fn historical_key(base: &CurrencyCode, range: &DateRange) -> String {
    format!(
        "historical:{base}:{}:{}",
        range.start().format("%Y-%m-%d"),
        range.end().format("%Y-%m-%d")
    )
}

/// Sorts points ascending by date and cuts out one page.
///
/// `total_items` is the size of the full series, not of the page.
pub fn paginate(points: &[HistoricalRatePoint], page: PageRequest) -> PagedResult<HistoricalRatePointDto> {
    let mut ordered: Vec<&HistoricalRatePoint> = points.iter().collect();
    ordered.sort_by_key(|p| p.date);

    let total = ordered.len();
    let items = ordered
        .into_iter()
        .skip(page.skip())
        .take(page.page_size() as usize)
        .map(HistoricalRatePointDto::from)
        .collect();

    PagedResult::new(items, page, total)
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Live currency conversion.
///
/// Generic over `P: RateProvider` - the adapter is injected at compile time.
/// Conversions are never cached since the amount varies per request.
pub struct ConversionService<P: RateProvider> {
    provider: P,
}

impl<P: RateProvider> ConversionService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Converts `amount` from `from_raw` into `to_raw`.
    ///
    /// Currency codes are checked first, then the amount, then the exclusion list.
    #[tracing::instrument(skip(self, amount), fields(%amount))]
    pub async fn convert(&self, amount: Decimal, from_raw: &str, to_raw: &str) -> Result<ConversionDto, AppError> {
        let from = CurrencyCode::new(from_raw)?;
        let to = CurrencyCode::new(to_raw)?;
        let request = ConversionRequest::create(amount, from, to)?;

        let result = self
            .provider
            .convert(request.from().amount(), request.from().currency(), request.to())
            .await?;

        tracing::debug!(rate = %result.rate_used, "Conversion completed");
        Ok(ConversionDto::from(result))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange Rates
// ─────────────────────────────────────────────────────────────────────────────

/// Latest and historical rate lookups, fronted by a TTL cache.
///
/// The exclusion list does not apply here; rates for TRY, PLN, THB and MXN
/// may be looked up even though they cannot be converted.
pub struct ExchangeRatesService<P: RateProvider, C: RateCache> {
    provider: P,
    cache: C,
}

impl<P: RateProvider, C: RateCache> ExchangeRatesService<P, C> {
    pub fn new(provider: P, cache: C) -> Self {
        Self { provider, cache }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Latest rates for `base_raw`, cached for five minutes.
    #[tracing::instrument(skip(self))]
    pub async fn latest(&self, base_raw: &str) -> Result<LatestRatesDto, AppError> {
        let base = CurrencyCode::new(base_raw)?;

        let result: Arc<LatestRatesResult> = self
            .cache
            .get_or_create(&latest_key(&base), LATEST_TTL, || async {
                self.provider.latest_rates(&base).await.map(Arc::new)
            })
            .await?;

        Ok(LatestRatesDto::from(result.as_ref()))
    }

    /// One page of historical rates, sorted ascending by date.
    pub async fn historical_page(
        &self,
        base_raw: &str,
        start: NaiveDate,
        end: NaiveDate,
        page: i64,
        page_size: i64,
    ) -> Result<PagedResult<HistoricalRatePointDto>, AppError> {
        let (_, _, paged) = self.load_historical(base_raw, start, end, page, page_size).await?;
        Ok(paged)
    }

    /// Like [`historical_page`](Self::historical_page), wrapped in the HTTP
    /// response envelope echoing the normalized base and the requested range.
    pub async fn historical(
        &self,
        base_raw: &str,
        start: NaiveDate,
        end: NaiveDate,
        page: i64,
        page_size: i64,
    ) -> Result<HistoricalRatesResponse, AppError> {
        let (base, range, paged) = self.load_historical(base_raw, start, end, page, page_size).await?;
        Ok(HistoricalRatesResponse::new(
            base.to_string(),
            range.start(),
            range.end(),
            paged,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn load_historical(
        &self,
        base_raw: &str,
        start: NaiveDate,
        end: NaiveDate,
        page: i64,
        page_size: i64,
    ) -> Result<(CurrencyCode, DateRange, PagedResult<HistoricalRatePointDto>), AppError> {
        let base = CurrencyCode::new(base_raw)?;
        let range = DateRange::create(start, end)?;
        let page = PageRequest::create(page, page_size)?;

        let result: Arc<HistoricalRatesResult> = self
            .cache
            .get_or_create(&historical_key(&base, &range), HISTORICAL_TTL, || async {
                self.provider.historical_rates(&base, range).await.map(Arc::new)
            })
            .await?;

        let paged = paginate(&result.points, page);
        tracing::debug!(
            total_items = paged.total_items,
            returned = paged.items.len(),
            "Historical page computed"
        );
        Ok((base, range, paged))
    }
}
