//! # Activity Content
//!
//! A resilient pipeline that turns a story into interactive reading-activity
//! content (characters, settings, event sequencing, main idea, vocabulary
//! and predictions) using an external generative language model.
//!
//! This crate provides:
//!
//! - Error classification separating retryable from regenerable failures
//! - Resilience patterns (backoff, retries, circuit breaker, call timeouts)
//! - A time-bounded content cache
//! - Age-appropriateness and structural validation
//! - One extraction strategy per activity type
//! - Static fallback templates so callers always get valid content
//!
//! ## Architecture
//!
//! - `ContentPipeline`: the entry point, composing everything below
//! - `GenerationClient`: the seam to the external model (OpenAI-compatible
//!   implementation included)
//! - `ExtractionStrategy`: prompt building and parsing per activity type
//! - `ContentValidator`: banned terms, repetition and schema checks
//! - `Resilience`: facade over retry, circuit breaker and timeout
//! - `GenerationError`: the error taxonomy

pub mod cache;
pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod orchestrator;
pub mod resilience;
pub mod strategies;
pub mod util;
pub mod validation;

pub use cache::{CacheConfig, CacheStats, ContentCache};
pub use client::{
    CallOutcome, CallRecord, GenerationClient, LogTelemetrySink, NoopTelemetrySink,
    OpenAIGenerationClient, Prompt, TelemetrySink,
};
pub use config::{ConfigProvider, OpenAIConfig, PipelineConfig};
pub use content::{
    ActivityContent, ActivityResult, ActivityType, ContentOrigin, GenerationRequest,
    ModelParameters, StudentProfile,
};
pub use error::{ErrorContext, ErrorKind, GenerationError, Result};
pub use fallback::FallbackLibrary;
pub use logging::init_logging;
pub use orchestrator::{ContentPipeline, ContentPipelineBuilder};
pub use resilience::{CircuitBreaker, CircuitBreakerStatus, Resilience, RetryExecutor};
pub use strategies::{strategy_for, ExtractionStrategy};
pub use validation::{ContentValidator, Severity, ValidationResult};

#[cfg(test)]
mod tests;
