//! Exchange rate provider adapters.
//!
//! Implements the [`RateProvider`](converter_types::RateProvider) port against
//! the Frankfurter API. Every upstream call runs through a resilience pipeline,
//! outermost to innermost:
//!
//! 1. timeout covering the whole call including retries
//! 2. retry with exponential backoff and jitter
//! 3. sliding-window circuit breaker
//! 4. outbound decorator forwarding the correlation id and logging the call
//!
//! Retry and circuit breaker share the classifier in [`classifier`].
//!
//! # Example
//! ```no_run
//! use exchange_rates::{FrankfurterOptions, FrankfurterProvider, ResilienceOptions};
//!
//! let provider = FrankfurterProvider::new(
//!     FrankfurterOptions::default(),
//!     ResilienceOptions::default(),
//! )?;
//! # Ok::<(), converter_types::ProviderError>(())
//! ```

pub mod circuit_breaker;
pub mod classifier;
pub mod correlation;
pub mod frankfurter;
pub mod outbound;
pub mod registry;
pub mod resilience;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use frankfurter::{FrankfurterOptions, FrankfurterProvider};
pub use outbound::{OutboundClient, UpstreamResponse};
pub use registry::ProviderRegistry;
pub use resilience::{ResilienceOptions, ResiliencePipeline};
