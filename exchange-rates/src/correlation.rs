//! Request-scoped correlation id.
//!
//! The inbound middleware runs each request inside [`scope`]; the outbound
//! decorator reads it back with [`current`] to forward it upstream.

use std::future::Future;

/// Header carrying the correlation id, inbound and outbound.
pub const HEADER_NAME: &str = "x-correlation-id";

tokio::task_local! {
    static CORRELATION_ID: String;
}

/// Runs `fut` with `id` as the current correlation id.
pub async fn scope<F: Future>(id: String, fut: F) -> F::Output {
    CORRELATION_ID.scope(id, fut).await
}

/// The correlation id of the current request, if any.
pub fn current() -> Option<String> {
    CORRELATION_ID
        .try_with(|id| id.clone())
        .ok()
        .filter(|id| !id.trim().is_empty())
}
