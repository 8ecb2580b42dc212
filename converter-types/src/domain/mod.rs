//! Domain models for the currency converter.

pub mod conversion;
pub mod currency;
pub mod date_range;
pub mod money;
pub mod paging;
pub mod rates;

pub use conversion::ConversionRequest;
pub use currency::CurrencyCode;
pub use date_range::DateRange;
pub use money::Money;
pub use paging::{PageRequest, PagedResult};
pub use rates::{
    ConversionProviderResult, HistoricalRatePoint, HistoricalRatesResult, LatestRatesResult,
};
