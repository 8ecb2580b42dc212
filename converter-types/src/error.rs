//! Error types for the currency converter.

use std::time::Duration;

use crate::ports::ProviderKey;

/// Domain-level errors (invalid input or business rule violations).
///
/// Every variant is a client error; the message is shown to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Malformed argument such as an empty or wrong-length currency code.
    #[error("{0}")]
    InvalidArgument(String),

    /// A paging parameter outside its valid range.
    #[error("Specified argument was out of the range of valid values. (Parameter '{0}')")]
    OutOfRange(&'static str),

    /// A business rule was violated.
    #[error("{0}")]
    Validation(String),
}

/// Rate provider errors (upstream and resilience failures).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Circuit is open for provider {0}")]
    CircuitOpen(String),

    #[error("Upstream call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No currency provider registered for key '{0}'")]
    NotRegistered(ProviderKey),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Internal(err.to_string())
    }
}
