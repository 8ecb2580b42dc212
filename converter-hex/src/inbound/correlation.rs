//! Correlation id middleware.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use exchange_rates::correlation;
use tracing::Instrument;

/// Reads `X-Correlation-ID` (or generates one), scopes it for the outbound
/// client, records it on the request span and echoes it on the response.
pub async fn correlation_middleware(request: Request<Body>, next: Next) -> Response {
    let id = request
        .headers()
        .get(correlation::HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

    let span = tracing::info_span!("request", correlation_id = %id);
    let mut response = correlation::scope(id.clone(), next.run(request))
        .instrument(span)
        .await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(correlation::HEADER_NAME, value);
    }
    response
}
