use std::time::Duration;

use super::{ConfigProvider, ConfigProviderExt, ConfigSection};
use crate::cache::CacheConfig;
use crate::error::{GenerationError, Result};
use crate::resilience::{BackoffConfig, CircuitBreakerConfig, RetryConfig};

/// Tuning for the whole generation pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Ceiling raced against each external call
    pub call_timeout: Duration,

    /// Backoff/retry tier for a single call
    pub retry: RetryConfig,

    pub circuit_breaker: CircuitBreakerConfig,

    pub cache: CacheConfig,

    /// Attempts after the first before falling back to templates
    pub max_regenerations: u32,

    /// Wall-clock ceiling across the generate and regenerate tiers
    pub generation_deadline: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(20),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            cache: CacheConfig::default(),
            max_regenerations: 3,
            generation_deadline: Some(Duration::from_secs(90)),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a provider, falling back to defaults per key
    ///
    /// A `generation_deadline` of `0` or `none` disables the deadline.
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();
        let default_backoff = &defaults.retry.backoff;

        let generation_deadline = match provider.get_string("generation_deadline") {
            Ok(value) if matches!(value.trim(), "0" | "none" | "off") => None,
            Ok(_) => Some(provider.get_duration("generation_deadline")?),
            Err(_) => defaults.generation_deadline,
        };

        let config = Self {
            call_timeout: provider.get_duration_or("call_timeout", defaults.call_timeout),
            retry: RetryConfig {
                max_retries: provider
                    .get_int_or("max_retries", defaults.retry.max_retries as i64)
                    .max(0) as u32,
                backoff: BackoffConfig {
                    base_delay: provider.get_duration_or("backoff_base", default_backoff.base_delay),
                    max_delay: provider.get_duration_or("backoff_max", default_backoff.max_delay),
                    min_delay: provider.get_duration_or("backoff_min", default_backoff.min_delay),
                    jitter_factor: provider.get_float_or("backoff_jitter", default_backoff.jitter_factor),
                },
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: provider
                    .get_int_or(
                        "breaker_failure_threshold",
                        defaults.circuit_breaker.failure_threshold as i64,
                    )
                    .max(0) as usize,
                cooldown: provider
                    .get_duration_or("breaker_cooldown", defaults.circuit_breaker.cooldown),
            },
            cache: CacheConfig {
                ttl: provider.get_duration_or("cache_ttl", defaults.cache.ttl),
                max_entries: provider
                    .get_int_or("cache_max_entries", defaults.cache.max_entries as i64)
                    .max(0) as usize,
                eviction_fraction: provider
                    .get_float_or("cache_eviction_fraction", defaults.cache.eviction_fraction),
            },
            max_regenerations: provider
                .get_int_or("max_regenerations", defaults.max_regenerations as i64)
                .max(0) as u32,
            generation_deadline,
        };

        config.validate()?;
        Ok(config)
    }

    /// Total generation attempts, the first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_regenerations.saturating_add(1)
    }

    /// Upper bound on time spent before a request falls back
    ///
    /// Every attempt may make `max_retries + 1` calls that each run to the
    /// timeout, separated by the longest possible backoff delay.
    pub fn worst_case_latency(&self) -> Duration {
        let attempts = self.max_attempts();
        let calls = attempts.saturating_mul(self.retry.max_retries.saturating_add(1));
        let sleeps = attempts.saturating_mul(self.retry.max_retries);

        let jitter = self.retry.backoff.jitter_factor.clamp(0.0, 1.0);
        let longest_sleep =
            Duration::from_secs_f64(self.retry.backoff.max_delay.as_secs_f64() * (1.0 + jitter));

        let unbounded = self
            .call_timeout
            .saturating_mul(calls)
            .saturating_add(longest_sleep.saturating_mul(sleeps));

        match self.generation_deadline {
            Some(deadline) => unbounded.min(deadline),
            None => unbounded,
        }
    }
}

impl ConfigSection for PipelineConfig {
    fn validate(&self) -> Result<()> {
        let backoff = &self.retry.backoff;

        if self.call_timeout.is_zero() {
            return Err(GenerationError::configuration("call_timeout must be positive"));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(GenerationError::configuration(
                "breaker_failure_threshold must be at least 1",
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(GenerationError::configuration("cache_max_entries must be at least 1"));
        }
        if self.cache.ttl.is_zero() {
            return Err(GenerationError::configuration("cache_ttl must be positive"));
        }
        if backoff.min_delay > backoff.max_delay {
            return Err(GenerationError::configuration(format!(
                "backoff_min ({:?}) exceeds backoff_max ({:?})",
                backoff.min_delay, backoff.max_delay
            )));
        }
        if !(0.0..=1.0).contains(&backoff.jitter_factor) {
            return Err(GenerationError::configuration("jitter factor must be within 0..=1"));
        }
        if matches!(self.generation_deadline, Some(d) if d.is_zero()) {
            return Err(GenerationError::configuration("generation_deadline must be positive"));
        }

        Ok(())
    }

    fn section_name(&self) -> &str {
        "pipeline"
    }
}
