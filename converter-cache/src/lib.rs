//! # Converter Cache
//!
//! Cache adapters implementing the [`RateCache`](converter_types::RateCache) port.
//!
//! Only a process-local cache exists; there is no persistence across restarts.

pub mod memory;

pub use memory::MemoryRateCache;
