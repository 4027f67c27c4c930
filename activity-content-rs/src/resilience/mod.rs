//! Resilience patterns for the generation-service call
//!
//! This module provides the guards around every external call:
//! - Jittered exponential backoff
//! - Retry of the same call on retryable errors
//! - Circuit breaker shared by all requests
//! - A per-call timeout raced against the call
//! - Unified resilience facade

mod backoff;
mod circuit_breaker;
mod retry;

pub use backoff::{BackoffCalculator, BackoffConfig};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics};
pub use retry::{RetryConfig, RetryExecutor};

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{GenerationError, Result};
use crate::util::SharedRng;

/// A unified resilience facade that composes the call guards
///
/// Each attempt passes the circuit breaker gate first; a rejected attempt
/// never starts the call. Admitted calls race `call_timeout`, and every
/// outcome is recorded on the breaker. Retryable failures are repeated by
/// the retry executor after a backoff delay.
pub struct Resilience {
    /// Retry executor
    retry: RetryExecutor,

    /// Circuit breaker
    circuit_breaker: Arc<CircuitBreaker>,

    /// Ceiling for a single call
    call_timeout: Duration,
}

impl Clone for Resilience {
    fn clone(&self) -> Self {
        Self {
            retry: self.retry.clone(),
            circuit_breaker: Arc::clone(&self.circuit_breaker),
            call_timeout: self.call_timeout,
        }
    }
}

impl Default for Resilience {
    fn default() -> Self {
        Self::new(
            RetryConfig::default(),
            CircuitBreakerConfig::default(),
            Duration::from_secs(20),
        )
    }
}

impl Resilience {
    /// Create a new resilience facade with specified configurations
    pub fn new(
        retry_config: RetryConfig,
        circuit_breaker_config: CircuitBreakerConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            retry: RetryExecutor::new(retry_config),
            circuit_breaker: Arc::new(CircuitBreaker::new(circuit_breaker_config)),
            call_timeout,
        }
    }

    /// Execute a fallible call with all configured resilience patterns
    pub async fn execute<F, Fut, T>(&self, rng: &SharedRng, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_observed(rng, operation, |_, _| {}).await
    }

    /// Like [`Resilience::execute`], reporting every completed call to `observe`
    ///
    /// `observe` sees the outcome and duration of each call that was actually
    /// started, timeouts included. Calls rejected by the breaker are not
    /// reported.
    pub async fn execute_observed<F, Fut, T, O>(
        &self,
        rng: &SharedRng,
        mut operation: F,
        observe: O,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        O: Fn(&Result<T>, Duration),
    {
        let observe = &observe;
        self.retry
            .execute(rng, move || {
                let admitted = self.circuit_breaker.check().map(|()| operation());
                self.guarded_call(admitted, observe)
            })
            .await
    }

    async fn guarded_call<Fut, T, O>(&self, admitted: Result<Fut>, observe: &O) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
        O: Fn(&Result<T>, Duration),
    {
        let call = admitted?;
        let started = Instant::now();

        let result = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::network(format!(
                "call timed out after {}ms",
                self.call_timeout.as_millis()
            ))),
        };

        observe(&result, started.elapsed());

        match &result {
            Ok(_) => self.circuit_breaker.record_success(),
            Err(err) => {
                log::debug!("Recording call failure on circuit breaker: {}", err);
                self.circuit_breaker.record_failure();
            }
        }

        result
    }

    /// Get the current status of the circuit breaker
    pub fn circuit_breaker_status(&self) -> CircuitBreakerStatus {
        self.circuit_breaker.status()
    }

    /// Get metrics about the circuit breaker
    pub fn circuit_breaker_metrics(&self) -> CircuitBreakerMetrics {
        self.circuit_breaker.metrics()
    }

    /// Reset the circuit breaker state
    pub fn reset_circuit_breaker(&self) {
        self.circuit_breaker.reset();
    }

    pub fn retry(&self) -> &RetryExecutor {
        &self.retry
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }
}

/// Status of a circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitBreakerStatus {
    /// Circuit is closed, allowing requests
    Closed,

    /// Circuit is open, rejecting requests
    Open,

    /// Circuit is half-open, allowing a single trial request
    HalfOpen,
}

impl std::fmt::Display for CircuitBreakerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}
