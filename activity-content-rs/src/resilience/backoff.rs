//! Jittered exponential backoff between retries of the same call

use std::fmt;
use std::time::Duration;

use rand::Rng;

/// Backoff policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry, before jitter
    pub base_delay: Duration,

    /// Ceiling applied to the exponential term, before jitter
    pub max_delay: Duration,

    /// Floor applied after jitter
    pub min_delay: Duration,

    /// Uniform jitter as a fraction of the delay (0.25 means ±25%)
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            min_delay: Duration::from_millis(100),
            jitter_factor: 0.25,
        }
    }
}

impl fmt::Display for BackoffConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BackoffConfig {{ base_delay: {:?}, max_delay: {:?}, min_delay: {:?}, jitter_factor: {} }}",
            self.base_delay, self.max_delay, self.min_delay, self.jitter_factor
        )
    }
}

/// Computes retry delays: `min(base * 2^(attempt-1), max)`, jittered, floored
#[derive(Debug, Clone)]
pub struct BackoffCalculator {
    config: BackoffConfig,
}

impl BackoffCalculator {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// The un-jittered delay for an attempt (attempt numbers start at 1)
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.max(1) - 1;
        // 2^31 ms is already far beyond any sane ceiling
        let factor = 2u32.checked_pow(exponent.min(31)).unwrap_or(u32::MAX);
        self.config
            .base_delay
            .checked_mul(factor)
            .unwrap_or(self.config.max_delay)
            .min(self.config.max_delay)
    }

    /// The jittered delay for an attempt, drawing jitter from `rng`
    pub fn delay<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let nominal = self.nominal_delay(attempt).as_secs_f64();
        let spread = self.config.jitter_factor.clamp(0.0, 1.0);
        let multiplier = if spread > 0.0 {
            rng.gen_range((1.0 - spread)..=(1.0 + spread))
        } else {
            1.0
        };

        Duration::from_secs_f64(nominal * multiplier).max(self.config.min_delay)
    }

    /// Upper bound of any delay this calculator can produce
    pub fn max_jittered_delay(&self) -> Duration {
        let spread = self.config.jitter_factor.clamp(0.0, 1.0);
        Duration::from_secs_f64(self.config.max_delay.as_secs_f64() * (1.0 + spread))
            .max(self.config.min_delay)
    }
}
