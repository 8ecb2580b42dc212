//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use converter_hex::inbound::{JwtOptions, ServerOptions};
use converter_types::ProviderKey;
use exchange_rates::{CircuitBreakerConfig, FrankfurterOptions, ResilienceOptions};

const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub provider: ProviderKey,
    pub frankfurter: FrankfurterOptions,
    pub resilience: ResilienceOptions,
    pub jwt: JwtOptions,
    pub server: ServerOptions,
    pub json_logs: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(&var, "PORT", 5014u16)?;

        let provider = match var("CURRENCY_PROVIDER") {
            Some(raw) => raw.parse::<ProviderKey>().map_err(anyhow::Error::msg)?,
            None => ProviderKey::Frankfurter,
        };

        let frankfurter = FrankfurterOptions {
            base_url: var("FRANKFURTER_BASE_URL")
                .unwrap_or_else(|| FrankfurterOptions::default().base_url),
        };

        let breaker_defaults = CircuitBreakerConfig::default();
        let circuit_breaker = CircuitBreakerConfig {
            sampling_duration: secs(&var, "RESILIENCE_CB_SAMPLING_SECONDS", breaker_defaults.sampling_duration)?,
            minimum_throughput: parse_or(
                &var,
                "RESILIENCE_CB_MINIMUM_THROUGHPUT",
                breaker_defaults.minimum_throughput,
            )?,
            failure_ratio: parse_or(&var, "RESILIENCE_CB_FAILURE_RATIO", breaker_defaults.failure_ratio)?,
            break_duration: secs(&var, "RESILIENCE_CB_BREAK_SECONDS", breaker_defaults.break_duration)?,
        };
        if !(0.0..=1.0).contains(&circuit_breaker.failure_ratio) {
            bail!("RESILIENCE_CB_FAILURE_RATIO must be between 0 and 1");
        }

        let resilience_defaults = ResilienceOptions::default();
        let resilience = ResilienceOptions {
            timeout: secs(&var, "RESILIENCE_TIMEOUT_SECONDS", resilience_defaults.timeout)?,
            max_retries: parse_or(&var, "RESILIENCE_RETRY_MAX_ATTEMPTS", resilience_defaults.max_retries)?,
            base_delay: Duration::from_millis(parse_or(
                &var,
                "RESILIENCE_RETRY_BASE_DELAY_MS",
                resilience_defaults.base_delay.as_millis() as u64,
            )?),
            circuit_breaker,
        };

        let signing_key = var("JWT_SIGNING_KEY")
            .context("JWT_SIGNING_KEY environment variable is required")?;
        if signing_key.len() < MIN_SIGNING_KEY_BYTES {
            bail!("JWT_SIGNING_KEY must be at least {MIN_SIGNING_KEY_BYTES} bytes");
        }

        let jwt = JwtOptions {
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "currency-converter".to_string()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "currency-converter".to_string()),
            signing_key,
            clock_skew: secs(&var, "JWT_CLOCK_SKEW_SECONDS", Duration::from_secs(30))?,
            token_lifetime: Duration::from_secs(
                parse_or(&var, "JWT_TOKEN_LIFETIME_MINUTES", 60u64)? * 60,
            ),
        };

        let server_defaults = ServerOptions::default();
        let server = ServerOptions {
            rate_limit_permits: parse_or(&var, "RATE_LIMIT_PERMITS", server_defaults.rate_limit_permits)?,
            rate_limit_period: secs(&var, "RATE_LIMIT_PERIOD_SECONDS", server_defaults.rate_limit_period)?,
            enable_dev_token_endpoint: parse_or(&var, "ENABLE_DEV_TOKEN_ENDPOINT", false)?,
            cors_allowed_origins: match var("CORS_ALLOWED_ORIGINS") {
                Some(raw) => raw
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect(),
                None => server_defaults.cors_allowed_origins,
            },
        };

        let json_logs = var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        Ok(Self {
            port,
            provider,
            frankfurter,
            resilience,
            jwt,
            server,
            json_logs,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn secs<F>(var: &F, key: &str, default: Duration) -> anyhow::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(var, key, default.as_secs()).map(Duration::from_secs)
}
