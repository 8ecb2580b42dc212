//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use converter_types::dto::{
    ConversionDto, DevTokenRequest, DevTokenResponse, HistoricalRatePointDto,
    HistoricalRatesResponse, LatestRatesDto,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

use crate::inbound::handlers::{ConvertQuery, HistoricalQuery, LatestQuery};

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Issue a development JWT (only when enabled)
#[utoipa::path(
    post,
    path = "/api/dev/token",
    tag = "auth",
    request_body = DevTokenRequest,
    responses(
        (status = 200, description = "Token issued", body = DevTokenResponse),
        (status = 400, description = "ClientId missing", example = json!({"error": "ClientId is required."}))
    )
)]
async fn dev_token() {}

/// Convert an amount between two currencies at the latest rate
#[utoipa::path(
    get,
    path = "/api/v1/convert",
    tag = "conversion",
    params(ConvertQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Converted amount", body = ConversionDto),
        (status = 400, description = "Invalid amount or currency, or excluded currency", example = json!({"error": "Currency conversion is not supported for TRY, PLN, THB, or MXN."})),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Token lacks the convert or admin role"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
async fn convert() {}

/// Latest rates for a base currency
#[utoipa::path(
    get,
    path = "/api/v1/rates/latest",
    tag = "rates",
    params(LatestQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Latest rates", body = LatestRatesDto),
        (status = 400, description = "Invalid currency code"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Token lacks the rates.read or admin role"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
async fn latest_rates() {}

/// Historical rates, sorted by date and paginated
#[utoipa::path(
    get,
    path = "/api/v1/rates/historical",
    tag = "rates",
    params(HistoricalQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "One page of historical rates", body = HistoricalRatesResponse),
        (status = 400, description = "Invalid currency, date range or paging"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Token lacks the history.read or admin role"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
async fn historical_rates() {}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Currency Converter API",
        version = "1.0.0",
        description = "Currency conversion and latest/historical exchange rates backed by the Frankfurter API.\n\n## Authentication\n\nAll `/api/v1` endpoints require a Bearer JWT. In development, `POST /api/dev/token` issues one:\n\n```\nAuthorization: Bearer <token>\n```",
        license(name = "MIT"),
    ),
    paths(health, dev_token, convert, latest_rates, historical_rates),
    components(
        schemas(
            ConversionDto,
            LatestRatesDto,
            HistoricalRatePointDto,
            HistoricalRatesResponse,
            DevTokenRequest,
            DevTokenResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Development token issuing"),
        (name = "conversion", description = "Currency conversion"),
        (name = "rates", description = "Latest and historical exchange rates"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for Bearer token authentication.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
