//! # Converter Hex
//!
//! Application service layer and HTTP adapter for the currency converter.
//!
//! ## Architecture
//!
//! - `service/` - Application services (validation, caching, pagination)
//! - `inbound/` - HTTP adapter (Axum server, JWT auth, rate limiting)
//!
//! The services are generic over `P: RateProvider` and `C: RateCache`,
//! allowing different adapters to be injected.

pub mod inbound;
pub mod openapi;
pub mod service;


pub use service::{ConversionService, ExchangeRatesService};
