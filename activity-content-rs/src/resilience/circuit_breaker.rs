//! Circuit breaker guarding calls to the generation service
//!
//! After `failure_threshold` consecutive failures the circuit opens and
//! every call is rejected without I/O until `cooldown` elapses. The first
//! check after the cooldown moves the circuit to half-open and admits a
//! single trial call; its outcome closes or re-opens the circuit.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::{GenerationError, Result};
use crate::util::lock;

use super::CircuitBreakerStatus;

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before the circuit opens
    pub failure_threshold: usize,

    /// How long the circuit stays open before a trial call is allowed
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    status: CircuitBreakerStatus,
    failure_count: usize,
    last_failure_at: Option<Instant>,
    opened_at: Option<Instant>,
    trial_started_at: Option<Instant>,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            status: CircuitBreakerStatus::Closed,
            failure_count: 0,
            last_failure_at: None,
            opened_at: None,
            trial_started_at: None,
        }
    }
}

/// A thread-safe circuit breaker, shared by every request of a pipeline
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,

    /// Total number of failures
    total_failures: AtomicUsize,

    /// Total number of successes
    total_successes: AtomicUsize,

    /// Total number of calls rejected while open
    total_rejections: AtomicUsize,

    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the specified configuration
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::closed()),
            total_failures: AtomicUsize::new(0),
            total_successes: AtomicUsize::new(0),
            total_rejections: AtomicUsize::new(0),
            config,
        }
    }

    /// Check if the circuit admits a call
    pub fn check(&self) -> Result<()> {
        let mut state = lock(&self.state);
        let status = state.status;

        match status {
            CircuitBreakerStatus::Closed => Ok(()),
            CircuitBreakerStatus::Open => {
                let elapsed = state.opened_at.map(|at| at.elapsed());
                match elapsed {
                    Some(elapsed) if elapsed < self.config.cooldown => {
                        drop(state);
                        self.reject(self.config.cooldown - elapsed)
                    }
                    _ => {
                        log::info!("Circuit breaker transitioning to Half-Open state");
                        state.status = CircuitBreakerStatus::HalfOpen;
                        state.trial_started_at = Some(Instant::now());
                        Ok(())
                    }
                }
            }
            CircuitBreakerStatus::HalfOpen => {
                // A trial whose outcome was never recorded (e.g. cancelled)
                // must not wedge the circuit forever.
                let trial_stale = state
                    .trial_started_at
                    .map_or(true, |at| at.elapsed() >= self.config.cooldown);
                if trial_stale {
                    state.trial_started_at = Some(Instant::now());
                    Ok(())
                } else {
                    drop(state);
                    self.reject(Duration::ZERO)
                }
            }
        }
    }

    fn reject(&self, remaining: Duration) -> Result<()> {
        self.total_rejections.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::circuit_open(format!(
            "rejecting calls to the generation service for another {}ms",
            remaining.as_millis()
        )))
    }

    /// Record a successful call
    pub fn record_success(&self) {
        self.total_successes.fetch_add(1, Ordering::SeqCst);
        let mut state = lock(&self.state);
        let status = state.status;

        match status {
            CircuitBreakerStatus::Closed => {
                state.failure_count = 0;
            }
            CircuitBreakerStatus::HalfOpen => {
                log::info!("Circuit breaker trial call succeeded, transitioning to Closed state");
                let last_failure_at = state.last_failure_at;
                *state = BreakerState {
                    last_failure_at,
                    ..BreakerState::closed()
                };
            }
            CircuitBreakerStatus::Open => {
                log::debug!("Received success in Open state, ignoring");
            }
        }
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::SeqCst);
        let mut state = lock(&self.state);
        let now = Instant::now();
        state.last_failure_at = Some(now);
        let status = state.status;

        match status {
            CircuitBreakerStatus::Closed => {
                state.failure_count += 1;
                if state.failure_count >= self.config.failure_threshold {
                    log::warn!(
                        "Circuit breaker transitioning to Open state after {} consecutive failures",
                        state.failure_count
                    );
                    state.status = CircuitBreakerStatus::Open;
                    state.opened_at = Some(now);
                }
            }
            CircuitBreakerStatus::HalfOpen => {
                log::warn!("Circuit breaker trial call failed, re-opening");
                state.failure_count += 1;
                state.status = CircuitBreakerStatus::Open;
                state.opened_at = Some(now);
                state.trial_started_at = None;
            }
            CircuitBreakerStatus::Open => {
                log::debug!("Received failure in Open state, ignoring");
            }
        }
    }

    /// Reset the circuit breaker to closed state
    pub fn reset(&self) {
        *lock(&self.state) = BreakerState::closed();
    }

    /// Get the current circuit status
    pub fn status(&self) -> CircuitBreakerStatus {
        lock(&self.state).status
    }

    /// Get the current number of consecutive failures
    pub fn failure_count(&self) -> usize {
        lock(&self.state).failure_count
    }

    /// Get metrics about the circuit breaker
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let state = lock(&self.state);

        CircuitBreakerMetrics {
            status: state.status,
            failure_count: state.failure_count,
            last_failure_at: state.last_failure_at,
            opened_duration: state.opened_at.map(|at| at.elapsed()),
            total_failures: self.total_failures.load(Ordering::SeqCst),
            total_successes: self.total_successes.load(Ordering::SeqCst),
            total_rejections: self.total_rejections.load(Ordering::SeqCst),
            config: self.config.clone(),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

/// Metrics for a circuit breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerMetrics {
    /// Current status
    pub status: CircuitBreakerStatus,

    /// Current consecutive failure count
    pub failure_count: usize,

    /// When the most recent failure was recorded
    pub last_failure_at: Option<Instant>,

    /// Duration the circuit has been open, if applicable
    pub opened_duration: Option<Duration>,

    /// Total failures seen
    pub total_failures: usize,

    /// Total successes seen
    pub total_successes: usize,

    /// Calls rejected without I/O
    pub total_rejections: usize,

    /// Current configuration
    pub config: CircuitBreakerConfig,
}
