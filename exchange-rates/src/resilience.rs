//! Resilience pipeline: timeout → retry → circuit breaker.

use std::future::Future;
use std::time::Duration;

use converter_types::ProviderError;
use rand::Rng;
use reqwest::StatusCode;
use tokio::time::Instant;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::classifier::is_transient;

/// Tunables for the upstream resilience pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceOptions {
    /// Budget for one logical call, retries and backoff included.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff base; attempt `n` waits `base * 2^n` ± 50%.
    pub base_delay: Duration,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for ResilienceOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Something the classifier can inspect: a response with a status.
pub trait Outcome {
    fn status(&self) -> Option<StatusCode>;
}

/// Exponential backoff delay for a retry attempt (0-based), with ±50% jitter.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exp = base.as_millis() as f64 * 2f64.powi(attempt as i32);
    let half = (exp * 0.5) as u64;
    if half == 0 {
        return Duration::from_millis(exp as u64);
    }
    let offset = rand::rng().random_range(0..=half * 2);
    let total = exp as i64 + offset as i64 - half as i64;
    Duration::from_millis(total.max(0) as u64)
}

/// Timeout, retry and circuit breaker around one upstream operation.
///
/// One pipeline (and therefore one breaker) exists per provider instance.
#[derive(Debug)]
pub struct ResiliencePipeline {
    options: ResilienceOptions,
    breaker: CircuitBreaker,
}

impl ResiliencePipeline {
    pub fn new(name: impl Into<String>, options: ResilienceOptions) -> Self {
        let breaker = CircuitBreaker::new(name, options.circuit_breaker.clone());
        Self { options, breaker }
    }

    pub fn options(&self) -> &ResilienceOptions {
        &self.options
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Runs `call` under the pipeline.
    ///
    /// A transient outcome is retried until `max_retries` is exhausted, after
    /// which the last outcome is returned as-is (an error, or a response the
    /// caller must check). Non-transient outcomes return immediately. An open
    /// circuit fails fast with [`ProviderError::CircuitOpen`] and is not retried.
    ///
    /// The timeout bounds the whole call, backoff included. An attempt cut
    /// short by it counts as a breaker failure; dropping the returned future
    /// records nothing.
    pub async fn execute<T, F, Fut>(&self, mut call: F) -> Result<T, ProviderError>
    where
        T: Outcome,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let deadline = Instant::now() + self.options.timeout;
        let mut attempt = 0u32;

        loop {
            let Some(permit) = self.breaker.try_acquire() else {
                tracing::warn!(circuit = %self.breaker.name(), "Circuit open, failing fast");
                return Err(ProviderError::CircuitOpen(self.breaker.name().to_string()));
            };

            let outcome = match tokio::time::timeout_at(deadline, call()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    permit.record(true);
                    return Err(self.timed_out());
                }
            };
            let transient = is_transient(&outcome.as_ref().map(|r| r.status()));
            permit.record(transient);

            if !transient || attempt >= self.options.max_retries {
                return outcome;
            }

            let delay = backoff_delay(self.options.base_delay, attempt);
            match &outcome {
                Ok(response) => tracing::warn!(
                    attempt = attempt + 1,
                    status = ?response.status(),
                    delay_ms = delay.as_millis() as u64,
                    "Transient upstream status, retrying"
                ),
                Err(e) => tracing::warn!(
                    attempt = attempt + 1,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Transient upstream failure, retrying"
                ),
            }

            let wake = Instant::now() + delay;
            if wake >= deadline {
                tokio::time::sleep_until(deadline).await;
                return Err(self.timed_out());
            }
            tokio::time::sleep_until(wake).await;
            attempt += 1;
        }
    }

    fn timed_out(&self) -> ProviderError {
        tracing::warn!(timeout_ms = self.options.timeout.as_millis() as u64, "Upstream call timed out");
        ProviderError::Timeout(self.options.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Status(StatusCode);

    impl Outcome for Status {
        fn status(&self) -> Option<StatusCode> {
            Some(self.0)
        }
    }

    fn options(max_retries: u32) -> ResilienceOptions {
        ResilienceOptions {
            timeout: Duration::from_secs(60),
            max_retries,
            base_delay: Duration::from_millis(10),
            circuit_breaker: CircuitBreakerConfig {
                sampling_duration: Duration::from_secs(30),
                minimum_throughput: 100,
                failure_ratio: 0.5,
                break_duration: Duration::from_secs(20),
            },
        }
    }

    #[test]
    fn test_backoff_stays_within_jitter_bounds() {
        let base = Duration::from_millis(200);
        for attempt in 0..4 {
            let nominal = 200u64 * 2u64.pow(attempt);
            for _ in 0..50 {
                let delay = backoff_delay(base, attempt).as_millis() as u64;
                assert!(delay >= nominal / 2 && delay <= nominal + nominal / 2, "{delay} out of range");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_not_retried() {
        let pipeline = ResiliencePipeline::new("test", options(3));
        let calls = Arc::new(AtomicU32::new(0));

        let result = pipeline
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Status(StatusCode::OK))
                }
            })
            .await;

        assert_eq!(result.unwrap().0, StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_client_error_is_not_retried() {
        let pipeline = ResiliencePipeline::new("test", options(3));
        let calls = Arc::new(AtomicU32::new(0));

        let result = pipeline
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Status(StatusCode::NOT_FOUND))
                }
            })
            .await;

        assert_eq!(result.unwrap().0, StatusCode::NOT_FOUND);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.circuit_state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_status_retried_until_success() {
        let pipeline = ResiliencePipeline::new("test", options(3));
        let calls = Arc::new(AtomicU32::new(0));

        let result = pipeline
            .execute(|| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Ok(Status(StatusCode::SERVICE_UNAVAILABLE))
                    } else {
                        Ok(Status(StatusCode::OK))
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap().0, StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_returns_last_outcome() {
        let pipeline = ResiliencePipeline::new("test", options(3));
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<Status, _> = pipeline
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ProviderError::Transport("connection refused".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(ProviderError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_covers_whole_call() {
        let mut opts = options(3);
        opts.timeout = Duration::from_millis(50);
        let pipeline = ResiliencePipeline::new("test", opts);

        let result: Result<Status, _> = pipeline
            .execute(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Status(StatusCode::OK))
            })
            .await;

        assert!(matches!(result, Err(ProviderError::Timeout(d)) if d == Duration::from_millis(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_circuit_fails_fast_without_calling() {
        let mut opts = options(0);
        opts.circuit_breaker.minimum_throughput = 2;
        let pipeline = ResiliencePipeline::new("frankfurter", opts);
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let _ = pipeline
                .execute(|| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(Status(StatusCode::INTERNAL_SERVER_ERROR))
                    }
                })
                .await;
        }
        assert_eq!(pipeline.circuit_state(), CircuitState::Open);

        let result = pipeline
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Status(StatusCode::OK))
                }
            })
            .await;

        assert!(matches!(result, Err(ProviderError::CircuitOpen(ref name)) if name == "frankfurter"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_attempts_open_the_circuit() {
        let mut opts = options(0);
        opts.timeout = Duration::from_millis(50);
        opts.circuit_breaker.minimum_throughput = 2;
        let pipeline = ResiliencePipeline::new("frankfurter", opts);

        for _ in 0..2 {
            let result: Result<Status, _> = pipeline
                .execute(|| async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Status(StatusCode::OK))
                })
                .await;
            assert!(matches!(result, Err(ProviderError::Timeout(_))));
        }

        assert_eq!(pipeline.circuit_state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_during_backoff_is_reported() {
        let mut opts = options(3);
        opts.timeout = Duration::from_millis(50);
        opts.base_delay = Duration::from_secs(10);
        let pipeline = ResiliencePipeline::new("test", opts);
        let calls = Arc::new(AtomicU32::new(0));

        let result = pipeline
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Status(StatusCode::SERVICE_UNAVAILABLE))
                }
            })
            .await;

        assert!(matches!(result, Err(ProviderError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_call_records_nothing() {
        let mut opts = options(0);
        opts.circuit_breaker.minimum_throughput = 1;
        let pipeline = ResiliencePipeline::new("test", opts);

        let call = pipeline.execute(|| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Status(StatusCode::OK))
        });
        let cancelled = tokio::time::timeout(Duration::from_millis(10), call).await;

        assert!(cancelled.is_err());
        assert_eq!(pipeline.circuit_state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_recovers_after_break_duration() {
        let mut opts = options(0);
        opts.circuit_breaker.minimum_throughput = 2;
        let pipeline = ResiliencePipeline::new("test", opts);

        for _ in 0..2 {
            let _ = pipeline
                .execute(|| async { Ok(Status(StatusCode::INTERNAL_SERVER_ERROR)) })
                .await;
        }
        assert_eq!(pipeline.circuit_state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(10)).await;
        let still_open = pipeline.execute(|| async { Ok(Status(StatusCode::OK)) }).await;
        assert!(matches!(still_open, Err(ProviderError::CircuitOpen(_))));

        tokio::time::advance(Duration::from_secs(11)).await;
        let probe = pipeline.execute(|| async { Ok(Status(StatusCode::OK)) }).await;
        assert_eq!(probe.unwrap().0, StatusCode::OK);
        assert_eq!(pipeline.circuit_state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_probe_reopens_circuit() {
        let mut opts = options(0);
        opts.circuit_breaker.minimum_throughput = 1;
        let pipeline = ResiliencePipeline::new("test", opts);

        let _ = pipeline
            .execute(|| async { Ok(Status(StatusCode::BAD_GATEWAY)) })
            .await;
        assert_eq!(pipeline.circuit_state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(21)).await;
        let _ = pipeline
            .execute(|| async { Ok(Status(StatusCode::BAD_GATEWAY)) })
            .await;
        assert_eq!(pipeline.circuit_state(), CircuitState::Open);

        let result = pipeline.execute(|| async { Ok(Status(StatusCode::OK)) }).await;
        assert!(matches!(result, Err(ProviderError::CircuitOpen(_))));
    }
}
