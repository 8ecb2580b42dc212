//! HTTP Server configuration and startup.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use converter_types::{RateCache, RateProvider};
use exchange_rates::correlation::HEADER_NAME as CORRELATION_HEADER;

use super::auth::{JwtTokenService, Policy, auth_middleware, authorize};
use super::correlation::correlation_middleware;
use super::handlers::{self, AppState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::openapi::ApiDoc;
use crate::{ConversionService, ExchangeRatesService};

/// Inbound settings outside the services themselves.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub rate_limit_permits: u32,
    pub rate_limit_period: Duration,
    pub enable_dev_token_endpoint: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            rate_limit_permits: 60,
            rate_limit_period: Duration::from_secs(60),
            enable_dev_token_endpoint: false,
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:5174".to_string(),
            ],
        }
    }
}

/// HTTP Server for the Currency Converter API.
pub struct HttpServer<P: RateProvider, C: RateCache> {
    state: Arc<AppState<P, C>>,
    rate_limiter: Arc<RateLimiterState>,
    options: ServerOptions,
}

impl<P: RateProvider + 'static, C: RateCache> HttpServer<P, C> {
    pub fn new(
        conversion: ConversionService<P>,
        rates: ExchangeRatesService<P, C>,
        tokens: JwtTokenService,
        options: ServerOptions,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                conversion,
                rates,
                tokens: Arc::new(tokens),
            }),
            rate_limiter: Arc::new(RateLimiterState::new(
                options.rate_limit_permits,
                options.rate_limit_period,
            )),
            options,
        }
    }

    fn cors(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .options
            .cors_allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                HeaderName::from_static(CORRELATION_HEADER),
            ])
            .expose_headers([HeaderName::from_static(CORRELATION_HEADER)])
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        let protected = Router::new()
            .route(
                "/api/v1/convert",
                get(handlers::convert::<P, C>).route_layer(middleware::from_fn_with_state(
                    Policy::Convert,
                    authorize,
                )),
            )
            .route(
                "/api/v1/rates/latest",
                get(handlers::latest_rates::<P, C>).route_layer(middleware::from_fn_with_state(
                    Policy::RatesRead,
                    authorize,
                )),
            )
            .route(
                "/api/v1/rates/historical",
                get(handlers::historical_rates::<P, C>).route_layer(
                    middleware::from_fn_with_state(Policy::HistoryRead, authorize),
                ),
            )
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.state.tokens.clone(),
                auth_middleware,
            ));

        let mut public = Router::new().route("/health", get(handlers::health));
        if self.options.enable_dev_token_endpoint {
            tracing::warn!("Development token endpoint is enabled");
            public = public.route("/api/dev/token", post(handlers::dev_token::<P, C>));
        }

        public
            .merge(protected)
            .with_state(self.state.clone())
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .layer(metrics)
            .layer(middleware::from_fn(correlation_middleware))
            .layer(self.cors())
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
