//! Rate limiting middleware using Governor.
//!
//! Token bucket per partition: the authenticated client id, or the remote
//! address for anonymous callers.

use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde_json::json;
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use super::auth::Principal;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Rate limiter state shared across requests.
pub struct RateLimiterState {
    /// Per-partition rate limiters
    limiters: DashMap<String, Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
    /// Quota for new partitions
    quota: Quota,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self::new(60, Duration::from_secs(60))
    }
}

impl RateLimiterState {
    /// Creates a new rate limiter state.
    ///
    /// `permits` requests are available at once and refill evenly over
    /// `period`. Zero values are raised to one.
    pub fn new(permits: u32, period: Duration) -> Self {
        let burst = NonZeroU32::new(permits).unwrap_or(NonZeroU32::MIN);
        let replenish = period / burst.get();
        let quota = Quota::with_period(replenish)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        Self {
            limiters: DashMap::new(),
            quota,
        }
    }

    /// Returns true if the request is allowed, false if rate limited.
    pub fn check(&self, key: &str) -> bool {
        let limiter = self
            .limiters
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone();

        limiter.check().is_ok()
    }
}

/// Partition key for a request: `client:<sub>` or `ip:<addr>`.
pub fn partition_key(request: &Request<Body>) -> String {
    if let Some(principal) = request.extensions().get::<Principal>() {
        return format!("client:{}", principal.client_id);
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| format!("ip:{}", addr.ip()))
        .unwrap_or_else(|| "ip:unknown".to_string())
}

/// Rate limiting middleware. Runs after auth so the principal is known.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = partition_key(&request);

    if !limiter.check(&key) {
        tracing::warn!(partition = %key, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": RATE_LIMIT_MESSAGE })),
        )
            .into_response();
    }

    next.run(request).await
}
