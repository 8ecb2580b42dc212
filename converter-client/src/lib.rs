//! # Converter Client SDK
//!
//! A typed Rust client for the Currency Converter API.

use chrono::NaiveDate;
use converter_types::{
    ConversionDto, DevTokenRequest, DevTokenResponse, HistoricalRatesResponse, LatestRatesDto,
};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Currency Converter API client.
pub struct ConverterClient {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl ConverterClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http: Client::new(),
        }
    }

    /// Sets the bearer token sent with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let status = self.http.get(self.url("/health")).send().await?.status();
        Ok(status.is_success())
    }

    /// Requests a development token. Only works when the server enables it.
    pub async fn dev_token(
        &self,
        client_id: &str,
        roles: Vec<String>,
    ) -> Result<String, ClientError> {
        let req = DevTokenRequest {
            client_id: client_id.to_string(),
            roles,
        };
        let resp: DevTokenResponse = self.post("/api/dev/token", &req).await?;
        Ok(resp.token)
    }

    /// Converts `amount` of `from` into `to` at the latest rate.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
    ) -> Result<ConversionDto, ClientError> {
        self.get(
            "/api/v1/convert",
            &[
                ("amount", amount.to_string()),
                ("from", from.to_string()),
                ("to", to.to_string()),
            ],
        )
        .await
    }

    /// Latest rates for `base`.
    pub async fn latest(&self, base: &str) -> Result<LatestRatesDto, ClientError> {
        self.get("/api/v1/rates/latest", &[("baseCurrency", base.to_string())])
            .await
    }

    /// One page of historical rates for `base` between `start` and `end`.
    pub async fn historical(
        &self,
        base: &str,
        start: NaiveDate,
        end: NaiveDate,
        page: u32,
        page_size: u32,
    ) -> Result<HistoricalRatesResponse, ClientError> {
        self.get(
            "/api/v1/rates/historical",
            &[
                ("baseCurrency", base.to_string()),
                ("start", start.to_string()),
                ("end", end.to_string()),
                ("page", page.to_string()),
                ("pageSize", page_size.to_string()),
            ],
        )
        .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let req = self.http.get(self.url(path)).query(query);
        self.send(req).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let req = self.http.post(self.url(path)).json(body);
        self.send(req).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the token, sends, and maps non-2xx bodies to [`ClientError::Api`].
    async fn send<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => parsed.error,
                Err(_) => body,
            };
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Error payload returned by the API on every failure.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = ConverterClient::new("http://localhost:5014/");
        assert_eq!(client.base_url, "http://localhost:5014");
    }

    #[test]
    fn test_client_with_token() {
        let client = ConverterClient::new("http://localhost:5014").with_token("abc");
        assert_eq!(client.token, Some("abc".to_string()));
    }

    #[tokio::test]
    async fn test_convert_sends_query_and_token() {
        let app = Router::new().route(
            "/api/v1/convert",
            get(
                |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(headers["authorization"], "Bearer abc");
                    assert_eq!(q["amount"], "12.50");
                    assert_eq!(q["from"], "USD");
                    assert_eq!(q["to"], "EUR");
                    Json(serde_json::json!({
                        "amount": 12.5,
                        "from": "USD",
                        "to": "EUR",
                        "convertedAmount": 10.6875,
                        "rate": 0.855,
                        "date": "2024-01-15"
                    }))
                },
            ),
        );
        let client = ConverterClient::new(serve(app).await).with_token("abc");

        let dto = client.convert(dec!(12.50), "USD", "EUR").await.unwrap();
        assert_eq!(dto.to, "EUR");
        assert_eq!(dto.rate_used, dec!(0.855));
    }

    #[tokio::test]
    async fn test_error_body_becomes_api_error() {
        let app = Router::new().route(
            "/api/v1/rates/latest",
            get(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(serde_json::json!({ "error": "Forbidden" })),
                )
            }),
        );
        let client = ConverterClient::new(serve(app).await);

        let err = client.latest("EUR").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Api { status: 403, ref message } if message == "Forbidden"
        ));
    }

    #[tokio::test]
    async fn test_health_reports_status() {
        let app = Router::new().route("/health", get(|| async { "ok" }));
        let client = ConverterClient::new(serve(app).await);
        assert!(client.health().await.unwrap());
    }
}
