//! # Currency Converter Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Build the provider registry and resolve the active provider
//! - Create the conversion and exchange rate services over a shared cache
//! - Start the HTTP server

mod config;

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use converter_cache::MemoryRateCache;
use converter_hex::inbound::{HttpServer, JwtTokenService};
use converter_hex::{ConversionService, ExchangeRatesService};
use converter_types::RateProvider;
use exchange_rates::ProviderRegistry;

const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("currency-converter"), provider))
}

fn build_provider_registry(config: &config::Config) -> anyhow::Result<ProviderRegistry> {
    let registry = ProviderRegistry::from_options(
        config.provider,
        config.frankfurter.clone(),
        config.resilience.clone(),
    )?;
    tracing::info!(provider = %registry.active_key(), "Currency provider selected");
    Ok(registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize OpenTelemetry tracing
    let (otel_tracer, otel_provider) = init_tracer()?;
    let telemetry = tracing_opentelemetry::layer().with_tracer(otel_tracer);

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,converter_app=debug,converter_hex=debug,exchange_rates=debug".into()
            }),
        )
        .with(config.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.json_logs).then(tracing_subscriber::fmt::layer))
        .with(telemetry)
        .init();

    tracing::info!("Starting currency converter on port {}", config.port);
    tracing::info!("Upstream base URL: {}", config.frankfurter.base_url);

    let registry = build_provider_registry(&config)?;
    let provider: Arc<dyn RateProvider> = registry.active();

    let cache = Arc::new(MemoryRateCache::new());
    let purge = {
        let cache = cache.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_PURGE_INTERVAL);
            loop {
                interval.tick().await;
                cache.purge_expired();
            }
        })
    };

    let server = HttpServer::new(
        ConversionService::new(provider.clone()),
        ExchangeRatesService::new(provider, cache),
        JwtTokenService::new(config.jwt.clone()),
        config.server.clone(),
    );
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    purge.abort();

    // Ensure traces are flushed before exit
    let _ = otel_provider.shutdown();
    Ok(())
}
