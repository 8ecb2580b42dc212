//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod cache;
mod provider;

pub use cache::{CachedValue, RateCache, RateCacheExt};
pub use provider::{ProviderKey, RateProvider};
