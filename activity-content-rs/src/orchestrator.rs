//! The public entry point of the pipeline
//!
//! Per request: cache check, then up to `1 + max_regenerations` generation
//! attempts (each extracted, schema-checked and validated), then fallback.
//! The generate/regenerate tier is raced against `generation_deadline`.
//! Callers always receive schema-valid content.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};

use crate::cache::{cache_key, CacheStats, ContentCache};
use crate::client::{GenerationClient, LogTelemetrySink, OpenAIGenerationClient, TelemetrySink};
use crate::config::{ConfigSection, PipelineConfig, DEFAULT_PROVIDER};
use crate::content::{
    ActivityContent, ActivityResult, ActivityType, ContentOrigin, GenerationRequest,
    StudentProfile,
};
use crate::error::{GenerationError, Result};
use crate::fallback::FallbackLibrary;
use crate::resilience::{CircuitBreakerMetrics, CircuitBreakerStatus, Resilience};
use crate::strategies::{run_extraction, ExtractionContext};
use crate::util::{
    entropy_rng, generate_request_id, measure_time_async, seeded_rng, truncate_string, SharedRng,
};
use crate::validation::ContentValidator;

/// Resilient activity-content generator
///
/// Holds the state shared by every request: the circuit breaker, the cache
/// and the random source. Create one per process (or per test) and share it.
pub struct ContentPipeline {
    client: Arc<dyn GenerationClient>,
    resilience: Resilience,
    cache: ContentCache,
    validator: ContentValidator,
    fallback: FallbackLibrary,
    telemetry: Arc<dyn TelemetrySink>,
    rng: SharedRng,
    config: PipelineConfig,
}

impl ContentPipeline {
    /// Create a new builder for the pipeline
    pub fn builder() -> ContentPipelineBuilder {
        ContentPipelineBuilder::default()
    }

    /// A pipeline backed by the OpenAI client, configured from `ACTIVITY_*`
    /// environment variables
    pub fn from_env() -> Result<Self> {
        let config = PipelineConfig::from_provider(&**DEFAULT_PROVIDER)?;
        let client = OpenAIGenerationClient::from_env()?;
        Self::builder().client(client).config(config).build()
    }

    /// Generate content for one activity
    ///
    /// Never fails: when generation is exhausted, short-circuited or past its
    /// deadline, the fallback template for the type is returned.
    pub async fn generate_activity_content(
        &self,
        source_text: &str,
        profile: &StudentProfile,
        activity_type: ActivityType,
        use_cache: bool,
    ) -> ActivityResult {
        let request_id = generate_request_id();
        let key = cache_key(activity_type, profile.age_years, source_text);

        if use_cache {
            if let Some(content) = self.cache.get(&key) {
                debug!("[{}] Cache hit for {}", request_id, key);
                return ActivityResult {
                    content,
                    origin: ContentOrigin::Cached,
                    attempts: 0,
                    request_id,
                };
            }
        }

        let request = GenerationRequest::new(source_text, profile.age_years, activity_type);
        let attempts = AtomicU32::new(0);
        let generation = self.generate_validated(&request, &request_id, &attempts);

        let (generated, elapsed) = measure_time_async(|| async {
            match self.config.generation_deadline {
                Some(deadline) => match tokio::time::timeout(deadline, generation).await {
                    Ok(generated) => generated,
                    Err(_) => {
                        warn!(
                            "[{}] {} generation exceeded its {}ms deadline",
                            request_id,
                            activity_type,
                            deadline.as_millis()
                        );
                        None
                    }
                },
                None => generation.await,
            }
        })
        .await;
        let attempts = attempts.load(Ordering::SeqCst);

        match generated {
            Some(content) => {
                self.cache.set(key, content.clone());
                info!(
                    "[{}] Generated {} content in {} attempt(s), {}ms",
                    request_id,
                    activity_type,
                    attempts,
                    elapsed.as_millis()
                );
                ActivityResult {
                    content,
                    origin: ContentOrigin::Generated,
                    attempts,
                    request_id,
                }
            }
            None => {
                warn!(
                    "[{}] Falling back to template {} content after {} attempt(s), {}ms",
                    request_id,
                    activity_type,
                    attempts,
                    elapsed.as_millis()
                );
                ActivityResult {
                    content: self.fallback.template(activity_type),
                    origin: ContentOrigin::Fallback,
                    attempts,
                    request_id,
                }
            }
        }
    }

    /// Generate content for several activities of one source text concurrently
    ///
    /// Results are returned in the order of `activity_types`.
    pub async fn generate_activity_set(
        &self,
        source_text: &str,
        profile: &StudentProfile,
        activity_types: &[ActivityType],
    ) -> Vec<ActivityResult> {
        join_all(activity_types.iter().map(|&activity_type| {
            self.generate_activity_content(source_text, profile, activity_type, true)
        }))
        .await
    }

    async fn generate_validated(
        &self,
        request: &GenerationRequest,
        request_id: &str,
        attempts: &AtomicU32,
    ) -> Option<ActivityContent> {
        let ctx = ExtractionContext {
            client: self.client.as_ref(),
            resilience: &self.resilience,
            telemetry: self.telemetry.as_ref(),
            rng: &self.rng,
        };

        for attempt in 1..=self.config.max_attempts() {
            attempts.store(attempt, Ordering::SeqCst);
            let attempt_request = request.attempt(attempt);

            let failure = match run_extraction(&ctx, &attempt_request).await {
                Ok(content) => {
                    match self
                        .validator
                        .validate(&content, request.age_years)
                        .into_result()
                    {
                        Ok(()) => return Some(content),
                        Err(rejection) => rejection,
                    }
                }
                Err(err) => err,
            };

            if !failure.is_regenerable() {
                warn!(
                    "[{}] {} attempt {} failed with {}, not regenerating: {}",
                    request_id,
                    request.activity_type,
                    attempt,
                    failure.kind(),
                    truncate_string(&failure.to_string(), 200)
                );
                return None;
            }

            warn!(
                "[{}] {} attempt {}/{} failed with {}: {}",
                request_id,
                request.activity_type,
                attempt,
                self.config.max_attempts(),
                failure.kind(),
                truncate_string(&failure.to_string(), 200)
            );
        }

        None
    }

    /// Cache statistics for operational visibility
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop cached content for a source text, or everything when `None`
    pub fn invalidate(&self, source_text: Option<&str>) -> usize {
        let removed = self.cache.invalidate(source_text);
        info!("Invalidated {} cache entries", removed);
        removed
    }

    /// Drop expired cache entries
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn circuit_breaker_status(&self) -> CircuitBreakerStatus {
        self.resilience.circuit_breaker_status()
    }

    pub fn circuit_breaker_metrics(&self) -> CircuitBreakerMetrics {
        self.resilience.circuit_breaker_metrics()
    }

    pub fn reset_circuit_breaker(&self) {
        self.resilience.reset_circuit_breaker();
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Builder for [`ContentPipeline`]
#[derive(Default)]
pub struct ContentPipelineBuilder {
    client: Option<Arc<dyn GenerationClient>>,
    config: Option<PipelineConfig>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    rng: Option<SharedRng>,
}

impl ContentPipelineBuilder {
    /// Set the generation client
    pub fn client(mut self, client: impl GenerationClient + 'static) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Set a generation client shared with other owners
    pub fn shared_client(mut self, client: Arc<dyn GenerationClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the pipeline configuration
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the telemetry sink (defaults to logging)
    pub fn telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// Use a deterministic random source
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = Some(seeded_rng(seed));
        self
    }

    /// Use an existing random source
    pub fn rng(mut self, rng: SharedRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<ContentPipeline> {
        let client = self
            .client
            .ok_or_else(|| GenerationError::configuration("A generation client is required"))?;

        let config = self.config.unwrap_or_default();
        config.validate()?;

        debug!(
            "Building content pipeline: {}, breaker threshold {}, worst-case latency {:?}",
            config.retry,
            config.circuit_breaker.failure_threshold,
            config.worst_case_latency()
        );

        Ok(ContentPipeline {
            client,
            resilience: Resilience::new(
                config.retry.clone(),
                config.circuit_breaker.clone(),
                config.call_timeout,
            ),
            cache: ContentCache::new(config.cache.clone()),
            validator: ContentValidator::new(),
            fallback: FallbackLibrary::new(),
            telemetry: self
                .telemetry
                .unwrap_or_else(|| Arc::new(LogTelemetrySink)),
            rng: self.rng.unwrap_or_else(entropy_rng),
            config,
        })
    }
}
