//! Extraction strategies, one per activity type
//!
//! A strategy knows how to ask the generation service for one activity
//! shape and how to turn the raw completion into typed content. The shared
//! call path in [`run_extraction`] sends the prompt through the resilience
//! guards, records telemetry, parses, and checks the schema.

mod character;
mod main_idea;
mod prediction;
pub mod prompt;
mod sequence;
mod setting;
mod vocabulary;

pub use character::CharacterStrategy;
pub use main_idea::MainIdeaStrategy;
pub use prediction::PredictionStrategy;
pub use sequence::SequenceStrategy;
pub use setting::SettingStrategy;
pub use vocabulary::VocabularyStrategy;

use rand::RngCore;

use crate::client::{CallOutcome, CallRecord, GenerationClient, Prompt, TelemetrySink};
use crate::content::{ActivityContent, ActivityType, GenerationRequest};
use crate::error::Result;
use crate::resilience::Resilience;
use crate::util::{lock, SharedRng};
use crate::validation::structure;

/// Builds the request for one activity type and parses its response
pub trait ExtractionStrategy: Send + Sync {
    fn activity_type(&self) -> ActivityType;

    /// The prompt for a generation attempt
    fn build_prompt(&self, request: &GenerationRequest) -> Prompt;

    /// Parse a raw completion into content
    ///
    /// Fails with a parse error for malformed payloads; schema checks run
    /// separately.
    fn parse(&self, raw: &str, rng: &mut dyn RngCore) -> Result<ActivityContent>;
}

/// The strategy for an activity type
pub fn strategy_for(activity_type: ActivityType) -> &'static dyn ExtractionStrategy {
    match activity_type {
        ActivityType::Who => &CharacterStrategy,
        ActivityType::Where => &SettingStrategy,
        ActivityType::Sequence => &SequenceStrategy,
        ActivityType::MainIdea => &MainIdeaStrategy,
        ActivityType::Vocabulary => &VocabularyStrategy,
        ActivityType::Prediction => &PredictionStrategy,
    }
}

/// Collaborators shared by every extraction of a pipeline
pub struct ExtractionContext<'a> {
    pub client: &'a dyn GenerationClient,
    pub resilience: &'a Resilience,
    pub telemetry: &'a dyn TelemetrySink,
    pub rng: &'a SharedRng,
}

/// Run one generation attempt end to end
pub async fn run_extraction(
    ctx: &ExtractionContext<'_>,
    request: &GenerationRequest,
) -> Result<ActivityContent> {
    let strategy = strategy_for(request.activity_type);
    let prompt = strategy.build_prompt(request);
    let params = request.parameters();
    let input_size = prompt.input_size();

    log::debug!(
        "Extracting {} content (attempt {}, temperature {:.1}, max_tokens {})",
        request.activity_type,
        request.attempt_number,
        params.temperature,
        params.max_tokens
    );

    let raw = ctx
        .resilience
        .execute_observed(
            ctx.rng,
            || ctx.client.call(&prompt, &params),
            |result: &Result<String>, elapsed| {
                let (outcome, output_size) = match result {
                    Ok(text) => (CallOutcome::Success, text.chars().count()),
                    Err(err) => (CallOutcome::Failure(err.kind()), 0),
                };
                ctx.telemetry.record(&CallRecord {
                    model: ctx.client.model().to_string(),
                    input_size,
                    output_size,
                    duration_ms: elapsed.as_millis() as u64,
                    outcome,
                    timestamp: chrono::Utc::now(),
                });
            },
        )
        .await?;

    let content = {
        let mut rng = lock(ctx.rng);
        strategy.parse(&raw, &mut *rng)?
    };
    structure::check(&content)?;

    Ok(content)
}
