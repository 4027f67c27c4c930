//! Data model for activity generation
//!
//! Requests, model parameters, the six activity types and the tagged
//! results handed back to callers.

mod activity;

pub use activity::{
    ActivityContent, Character, CharacterSet, Event, EventSequence, MainIdeaOption,
    MainIdeaQuestion, Prediction, PredictionSet, Setting, SettingSet, StorySegment,
    VocabularySet, VocabularyWord,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// The six interactive exercise kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    /// Character identification
    #[serde(rename = "who")]
    Who,
    /// Setting identification
    #[serde(rename = "where")]
    Where,
    /// Event sequencing
    #[serde(rename = "sequence")]
    Sequence,
    #[serde(rename = "main_idea")]
    MainIdea,
    /// Vocabulary matching
    #[serde(rename = "vocabulary")]
    Vocabulary,
    #[serde(rename = "prediction")]
    Prediction,
}

impl ActivityType {
    pub const ALL: [ActivityType; 6] = [
        ActivityType::Who,
        ActivityType::Where,
        ActivityType::Sequence,
        ActivityType::MainIdea,
        ActivityType::Vocabulary,
        ActivityType::Prediction,
    ];

    /// The wire name of the type
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Who => "who",
            ActivityType::Where => "where",
            ActivityType::Sequence => "sequence",
            ActivityType::MainIdea => "main_idea",
            ActivityType::Vocabulary => "vocabulary",
            ActivityType::Prediction => "prediction",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "who" | "character" | "characters" => Ok(ActivityType::Who),
            "where" | "setting" | "settings" => Ok(ActivityType::Where),
            "sequence" | "events" => Ok(ActivityType::Sequence),
            "main_idea" | "main-idea" | "mainidea" => Ok(ActivityType::MainIdea),
            "vocabulary" | "vocab" => Ok(ActivityType::Vocabulary),
            "prediction" | "predict" | "predictions" => Ok(ActivityType::Prediction),
            other => Err(GenerationError::configuration(format!(
                "unknown activity type '{}'",
                other
            ))),
        }
    }
}

/// The learner the content is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub age_years: u8,
}

impl StudentProfile {
    pub fn new(age_years: u8) -> Self {
        Self { age_years }
    }
}

/// Sampling parameters passed to the generation client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ModelParameters {
    const BASE_TEMPERATURE: f32 = 0.7;
    const TEMPERATURE_STEP: f32 = 0.2;
    const MIN_TEMPERATURE: f32 = 0.1;
    const BASE_MAX_TOKENS: u32 = 1200;
    const MAX_TOKENS_STEP: u32 = 400;

    /// Parameters for a generation attempt (attempt numbers start at 1)
    ///
    /// Each regeneration lowers variability and widens the output budget.
    pub fn for_attempt(attempt: u32) -> Self {
        let step = attempt.max(1) - 1;
        let temperature = (Self::BASE_TEMPERATURE - Self::TEMPERATURE_STEP * step as f32)
            .max(Self::MIN_TEMPERATURE);
        let max_tokens = Self::BASE_MAX_TOKENS.saturating_add(Self::MAX_TOKENS_STEP.saturating_mul(step));

        Self {
            temperature,
            max_tokens,
        }
    }
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self::for_attempt(1)
    }
}

/// One generation attempt for one activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub source_text: String,
    pub age_years: u8,
    pub activity_type: ActivityType,
    /// 1 for the first attempt, incremented per regeneration
    pub attempt_number: u32,
}

impl GenerationRequest {
    pub fn new(source_text: impl Into<String>, age_years: u8, activity_type: ActivityType) -> Self {
        Self {
            source_text: source_text.into(),
            age_years,
            activity_type,
            attempt_number: 1,
        }
    }

    /// The same request for a later attempt
    pub fn attempt(&self, attempt_number: u32) -> Self {
        Self {
            attempt_number,
            ..self.clone()
        }
    }

    pub fn is_regeneration(&self) -> bool {
        self.attempt_number > 1
    }

    pub fn parameters(&self) -> ModelParameters {
        ModelParameters::for_attempt(self.attempt_number)
    }
}

/// Where returned content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentOrigin {
    Generated,
    Cached,
    Fallback,
}

/// Content returned by the pipeline, tagged with its origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResult {
    pub content: ActivityContent,
    pub origin: ContentOrigin,
    /// Generation attempts made for this result (0 for cache hits)
    pub attempts: u32,
    pub request_id: String,
}

impl ActivityResult {
    pub fn is_fallback(&self) -> bool {
        self.origin == ContentOrigin::Fallback
    }

    pub fn activity_type(&self) -> ActivityType {
        self.content.activity_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_wire_names() {
        for t in ActivityType::ALL {
            assert_eq!(t.as_str().parse::<ActivityType>().unwrap(), t);
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        assert_eq!("Main-Idea".parse::<ActivityType>().unwrap(), ActivityType::MainIdea);
        assert_eq!("vocab".parse::<ActivityType>().unwrap(), ActivityType::Vocabulary);
        assert!("spelling".parse::<ActivityType>().is_err());
    }

    #[test]
    fn test_parameters_per_attempt() {
        let first = ModelParameters::for_attempt(1);
        assert!((first.temperature - 0.7).abs() < 1e-6);
        assert_eq!(first.max_tokens, 1200);

        let second = ModelParameters::for_attempt(2);
        assert!((second.temperature - 0.5).abs() < 1e-6);
        assert_eq!(second.max_tokens, 1600);

        let late = ModelParameters::for_attempt(9);
        assert!((late.temperature - 0.1).abs() < 1e-6);
        assert!(late.max_tokens > second.max_tokens);
    }

    #[test]
    fn test_content_serializes_tagged_camel_case() {
        let content = ActivityContent::MainIdea(MainIdeaQuestion {
            question: "What is the story mostly about?".into(),
            options: vec![MainIdeaOption {
                text: "A brave knight".into(),
                is_correct: true,
                rationale: "The whole story follows him.".into(),
            }],
        });

        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["type"], "mainIdea");
        assert_eq!(json["options"][0]["isCorrect"], true);

        let back: ActivityContent = serde_json::from_value(json).unwrap();
        assert_eq!(back, content);
        assert_eq!(back.activity_type(), ActivityType::MainIdea);
    }
}
