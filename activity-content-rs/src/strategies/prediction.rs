use rand::RngCore;
use serde::Deserialize;

use super::{prompt, ExtractionStrategy};
use crate::client::Prompt;
use crate::content::{ActivityContent, ActivityType, GenerationRequest, Prediction, PredictionSet};
use crate::error::{GenerationError, Result};

const TASK: &str = "Write one question asking what might happen after the story ends, and 4 to 6 \
possible predictions. Score each prediction's plausibility from 1 (very unlikely) to 10 (very \
likely) and justify the score with a rationale that points to clues in the text.";

const SCHEMA: &str = r#"{
  "question": "string",
  "predictions": [{"text": "string", "plausibilityScore": 7, "rationale": "string"}]
}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrediction {
    text: String,
    /// Models sometimes answer with fractional scores
    plausibility_score: f64,
    rationale: String,
}

#[derive(Debug, Deserialize)]
struct Payload {
    question: String,
    predictions: Vec<RawPrediction>,
}

/// Prediction
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionStrategy;

impl ExtractionStrategy for PredictionStrategy {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Prediction
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Prompt {
        prompt::build(request, TASK, SCHEMA)
    }

    fn parse(&self, raw: &str, _rng: &mut dyn RngCore) -> Result<ActivityContent> {
        let payload: Payload = prompt::parse_payload(raw)?;

        let predictions = payload
            .predictions
            .into_iter()
            .map(|p| {
                // Range is checked on the raw score, before rounding can pull it in
                if !(1.0..=10.0).contains(&p.plausibility_score) {
                    return Err(GenerationError::structural(format!(
                        "plausibility score {} outside 1-10",
                        p.plausibility_score
                    )));
                }
                Ok(Prediction {
                    text: prompt::clean(p.text),
                    plausibility_score: p.plausibility_score.round() as u8,
                    rationale: prompt::clean(p.rationale),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ActivityContent::Predictions(PredictionSet {
            question: prompt::clean(payload.question),
            predictions,
        }))
    }
}
