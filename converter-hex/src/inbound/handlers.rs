//! HTTP request handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::IntoParams;

use converter_types::{AppError, DevTokenRequest, DevTokenResponse, RateCache, RateProvider};

use super::auth::JwtTokenService;
use crate::{ConversionService, ExchangeRatesService};

const INTERNAL_MESSAGE: &str = "An unexpected error occurred.";

/// Application state shared across handlers.
pub struct AppState<P: RateProvider, C: RateCache> {
    pub conversion: ConversionService<P>,
    pub rates: ExchangeRatesService<P, C>,
    pub tokens: Arc<JwtTokenService>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(AppError::BadRequest(rejection.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(AppError::BadRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Query parameters
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConvertQuery {
    /// Amount in the source currency
    #[param(example = "100")]
    pub amount: String,
    /// Source currency code
    #[param(example = "USD")]
    pub from: String,
    /// Target currency code
    #[param(example = "EUR")]
    pub to: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LatestQuery {
    #[param(example = "EUR")]
    pub base_currency: String,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    30
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoricalQuery {
    #[param(example = "EUR")]
    pub base_currency: String,
    /// First day, `yyyy-MM-dd`
    #[param(value_type = String, example = "2024-01-01")]
    pub start: NaiveDate,
    /// Last day, `yyyy-MM-dd`
    #[param(value_type = String, example = "2024-01-31")]
    pub end: NaiveDate,
    #[serde(default = "default_page")]
    #[param(example = 1)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    #[param(example = 30)]
    pub page_size: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Issue a development token.
#[tracing::instrument(skip_all)]
pub async fn dev_token<P: RateProvider + 'static, C: RateCache>(
    State(state): State<Arc<AppState<P, C>>>,
    body: Result<Json<DevTokenRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    if req.client_id.trim().is_empty() {
        return Err(AppError::BadRequest("ClientId is required.".into()).into());
    }

    let token = state
        .tokens
        .create_token(&req.client_id, &req.roles)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(client_id = %req.client_id, roles = ?req.roles, "Development token issued");
    Ok(Json(DevTokenResponse { token }))
}

/// Convert an amount between currencies.
#[tracing::instrument(skip_all)]
pub async fn convert<P: RateProvider + 'static, C: RateCache>(
    State(state): State<Arc<AppState<P, C>>>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(q) = query?;
    let amount = Decimal::from_str(q.amount.trim())
        .map_err(|_| AppError::BadRequest("Amount must be a valid decimal number.".into()))?;

    let dto = state.conversion.convert(amount, &q.from, &q.to).await?;
    Ok(Json(dto))
}

/// Latest rates for a base currency.
#[tracing::instrument(skip_all)]
pub async fn latest_rates<P: RateProvider + 'static, C: RateCache>(
    State(state): State<Arc<AppState<P, C>>>,
    query: Result<Query<LatestQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(q) = query?;
    let dto = state.rates.latest(&q.base_currency).await?;
    Ok(Json(dto))
}

/// One page of historical rates.
#[tracing::instrument(skip_all)]
pub async fn historical_rates<P: RateProvider + 'static, C: RateCache>(
    State(state): State<Arc<AppState<P, C>>>,
    query: Result<Query<HistoricalQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(q) = query?;
    let response = state
        .rates
        .historical(&q.base_currency, q.start, q.end, q.page, q.page_size)
        .await?;
    Ok(Json(response))
}
