//! Outbound HTTP decorator: correlation id forwarding and call logging.

use std::time::{Duration, Instant};

use converter_types::ProviderError;
use reqwest::{Client, Method, StatusCode, Url};

use crate::correlation;
use crate::resilience::Outcome;

/// A fully-read upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

impl Outcome for UpstreamResponse {
    fn status(&self) -> Option<StatusCode> {
        Some(self.status)
    }
}

/// Thin wrapper around `reqwest::Client` used for every upstream call.
#[derive(Debug, Clone)]
pub struct OutboundClient {
    http: Client,
}

impl OutboundClient {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Builds a client with a per-attempt request timeout.
    pub fn with_request_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self::new(http))
    }

    /// Issues a GET and reads the body.
    ///
    /// Forwards the current correlation id, if any, as `X-Correlation-ID`.
    pub async fn get(&self, url: Url) -> Result<UpstreamResponse, ProviderError> {
        let method = Method::GET;
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(id) = correlation::current() {
            request = request.header(correlation::HEADER_NAME, id);
        }

        let started = Instant::now();
        let result = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse { status, body })
        }
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                tracing::info!(
                    %method,
                    %url,
                    status = response.status.as_u16(),
                    elapsed_ms,
                    "Outbound HTTP call completed"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(%method, %url, elapsed_ms, error = %e, "Outbound HTTP call failed");
                Err(ProviderError::Transport(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::HeaderMap, routing::get};

    async fn spawn_echo() -> Url {
        let app = Router::new().route(
            "/echo",
            get(|headers: HeaderMap| async move {
                headers
                    .get(correlation::HEADER_NAME)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string()
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/echo")).unwrap()
    }

    #[tokio::test]
    async fn test_forwards_correlation_id() {
        let url = spawn_echo().await;
        let client = OutboundClient::new(Client::new());

        let response = correlation::scope("corr-42".to_string(), client.get(url))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "corr-42");
    }

    #[tokio::test]
    async fn test_no_header_without_correlation_scope() {
        let url = spawn_echo().await;
        let client = OutboundClient::new(Client::new());

        let response = client.get(url).await.unwrap();
        assert_eq!(response.body, "none");
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OutboundClient::new(Client::new());
        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let result = client.get(url).await;
        assert!(matches!(result, Err(ProviderError::Transport(_))));
    }
}
