//! Activity generation demo
//!
//! Generates every activity type for a short story and prints the results
//! as JSON. With `ACTIVITY_OPENAI_API_KEY` set the OpenAI client is used;
//! without it the demo runs offline and shows the fallback tier.
//!
//! ```text
//! RUST_LOG=debug cargo run --example generate_demo
//! ```

use std::time::Duration;

use activity_content_rs::{
    init_logging, ActivityType, ContentPipeline, GenerationClient, GenerationError,
    ModelParameters, PipelineConfig, Prompt, StudentProfile,
};
use async_trait::async_trait;

const STORY: &str = "Mia found a tiny kitten shivering under the porch on a rainy morning. \
She wrapped it in her scarf and carried it inside. Her brother Leo warmed some milk while Mia \
made a bed from a shoebox. By evening the kitten was purring, and the family named her Pebble.";

/// Stands in for the service when no API key is configured
struct OfflineClient;

#[async_trait]
impl GenerationClient for OfflineClient {
    async fn call(
        &self,
        _prompt: &Prompt,
        _params: &ModelParameters,
    ) -> activity_content_rs::Result<String> {
        Err(GenerationError::network("offline demo: connection refused"))
    }

    fn model(&self) -> &str {
        "offline"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let pipeline = if std::env::var("ACTIVITY_OPENAI_API_KEY").is_ok() {
        ContentPipeline::from_env()?
    } else {
        log::warn!("ACTIVITY_OPENAI_API_KEY is not set, running offline");
        let mut config = PipelineConfig::default();
        config.retry.max_retries = 1;
        config.max_regenerations = 1;
        config.retry.backoff.base_delay = Duration::from_millis(50);
        ContentPipeline::builder()
            .client(OfflineClient)
            .config(config)
            .build()?
    };

    let profile = StudentProfile::new(8);
    let results = pipeline
        .generate_activity_set(STORY, &profile, &ActivityType::ALL)
        .await;

    for result in &results {
        println!(
            "== {} ({:?}, {} attempt(s)) ==",
            result.activity_type(),
            result.origin,
            result.attempts
        );
        println!("{}", serde_json::to_string_pretty(&result.content)?);
    }

    let stats = pipeline.cache_stats();
    println!(
        "cache: {} entries, {} hits, {} misses; breaker: {}",
        stats.total_entries,
        stats.hits,
        stats.misses,
        pipeline.circuit_breaker_status()
    );

    Ok(())
}
