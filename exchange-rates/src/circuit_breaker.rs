//! Sliding-window circuit breaker for upstream calls.
//!
//! The circuit has three states:
//!
//! - **Closed**: calls flow; outcomes are sampled over a sliding window.
//! - **Open**: calls fail fast until the break duration elapses.
//! - **HalfOpen**: a single probe call decides between Closed and Open.
//!
//! One breaker is shared by every in-flight request of a provider instance.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Circuit breaker thresholds and timers.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Window over which outcomes are sampled.
    pub sampling_duration: Duration,
    /// Calls required in the window before the ratio is evaluated.
    pub minimum_throughput: u32,
    /// Failure ratio (0.0..=1.0) at which the circuit opens.
    pub failure_ratio: f64,
    /// How long the circuit stays open before allowing a probe.
    pub break_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            sampling_duration: Duration::from_secs(30),
            minimum_throughput: 10,
            failure_ratio: 0.5,
            break_duration: Duration::from_secs(20),
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    /// (time, failed) for every call recorded while Closed.
    window: VecDeque<(Instant, bool)>,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            window: VecDeque::new(),
            opened_at: None,
            probe_in_flight: false,
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.probe_in_flight = false;
        self.window.clear();
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.opened_at = None;
        self.probe_in_flight = false;
        self.window.clear();
    }
}

/// Thread-safe sliding-window circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

/// Admission ticket for one call. Report the outcome with [`Permit::record`].
///
/// A permit dropped without a recorded outcome (the caller went away)
/// releases a half-open probe slot without changing state.
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    recorded: bool,
}

impl Permit<'_> {
    /// Records whether the call failed, consuming the permit.
    pub fn record(mut self, failed: bool) {
        self.recorded = true;
        if failed {
            self.breaker.on_failure(self.probe);
        } else {
            self.breaker.on_success(self.probe);
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.recorded && self.probe {
            self.breaker.lock().probe_in_flight = false;
        }
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lock the state, recovering from poison.
    ///
    /// Worst case after a poisoned lock is slightly stale statistics.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(circuit = %self.name, "Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Asks to make a call. Returns `None` while the circuit is open.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Some(Permit {
                breaker: self,
                probe: false,
                recorded: false,
            }),
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    return None;
                }
                inner.probe_in_flight = true;
                Some(Permit {
                    breaker: self,
                    probe: true,
                    recorded: false,
                })
            }
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|opened_at| opened_at.elapsed() >= self.config.break_duration)
                    .unwrap_or(true);
                if !elapsed {
                    return None;
                }

                tracing::info!(circuit = %self.name, "Circuit breaker transitioning from Open to HalfOpen");
                inner.state = CircuitState::HalfOpen;
                inner.probe_in_flight = true;
                Some(Permit {
                    breaker: self,
                    probe: true,
                    recorded: false,
                })
            }
        }
    }

    fn on_success(&self, probe: bool) {
        let mut inner = self.lock();
        if probe {
            tracing::info!(circuit = %self.name, "Circuit breaker probe succeeded, closing");
            inner.close();
            return;
        }
        if inner.state == CircuitState::Closed {
            self.sample(&mut inner, false);
        }
    }

    fn on_failure(&self, probe: bool) {
        let mut inner = self.lock();
        let now = Instant::now();
        if probe {
            tracing::warn!(circuit = %self.name, "Circuit breaker probe failed, reopening");
            inner.open(now);
            return;
        }
        if inner.state != CircuitState::Closed {
            return;
        }

        self.sample(&mut inner, true);

        let total = inner.window.len();
        let failures = inner.window.iter().filter(|(_, failed)| *failed).count();
        if total >= self.config.minimum_throughput as usize
            && failures as f64 / total as f64 >= self.config.failure_ratio
        {
            tracing::warn!(
                circuit = %self.name,
                failures,
                total,
                break_secs = self.config.break_duration.as_secs_f64(),
                "Circuit breaker opened"
            );
            inner.open(now);
        }
    }

    fn sample(&self, inner: &mut Inner, failed: bool) {
        let now = Instant::now();
        inner.window.push_back((now, failed));
        while let Some((at, _)) = inner.window.front() {
            if now.duration_since(*at) > self.config.sampling_duration {
                inner.window.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }
}
