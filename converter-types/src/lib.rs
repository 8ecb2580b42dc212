//! # Converter Types
//!
//! Domain types and port traits for the currency converter service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure value types (CurrencyCode, Money, DateRange, paging, rate results)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain, provider and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    ConversionProviderResult, ConversionRequest, CurrencyCode, DateRange, HistoricalRatePoint,
    HistoricalRatesResult, LatestRatesResult, Money, PageRequest, PagedResult,
};
pub use dto::*;
pub use error::{AppError, DomainError, ProviderError};
pub use ports::{CachedValue, ProviderKey, RateCache, RateCacheExt, RateProvider};
