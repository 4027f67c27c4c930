//! Shared fixtures: story text, well-formed model payloads and scripted clients

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{CallRecord, GenerationClient, Prompt, TelemetrySink};
use crate::content::{ActivityType, ModelParameters};
use crate::error::Result;

pub const KNIGHT_STORY: &str = "Sir Tom the knight woke up early. He put on his shiny armor \
and rode to the mountain. There he met a grumpy dragon who had taken the village bread. Tom \
shared his lunch and the dragon gave the bread back. The whole kingdom cheered for them.";

pub const WHO_PAYLOAD: &str = r#"{
  "characters": [
    {"name": "Sir Tom", "description": "A kind knight who likes to help his village."},
    {"name": "The dragon", "description": "A grumpy dragon who took the village bread."}
  ],
  "decoys": [
    {"name": "Princess Lila", "description": "A princess who travels by hot air balloon."}
  ]
}"#;

pub const WHERE_PAYLOAD: &str = r#"{
  "settings": [
    {"name": "The mountain", "description": "A tall rocky mountain where the dragon lives."},
    {"name": "The village", "description": "A small village with a busy bakery."}
  ],
  "decoys": [
    {"name": "The beach", "description": "A sandy beach with loud seagulls."}
  ]
}"#;

pub const SEQUENCE_PAYLOAD: &str = r#"{
  "events": [
    {"id": 1, "description": "The knight woke up early.", "segment": "beginning"},
    {"id": 2, "description": "He put on his shiny armor.", "segment": "beginning"},
    {"id": 3, "description": "He met the grumpy dragon on the mountain.", "segment": "middle"},
    {"id": 4, "description": "He helped bring the bread back to the kingdom.", "segment": "end"}
  ]
}"#;

pub const MAIN_IDEA_PAYLOAD: &str = r#"{
  "question": "What is this story mostly about?",
  "options": [
    {"text": "Kindness can solve a problem", "isCorrect": true, "rationale": "Tom shares his lunch and the dragon returns the bread."},
    {"text": "How armor is made", "isCorrect": false, "rationale": "The armor is only a small detail."},
    {"text": "Every animal in the world", "isCorrect": false, "rationale": "That is far too broad."},
    {"text": "A trip to the beach", "isCorrect": false, "rationale": "Nobody goes to a beach."}
  ]
}"#;

pub const VOCABULARY_PAYLOAD: &str = r#"{
  "words": [
    {"word": "armor", "definition": "Metal clothing that protects the body.", "example": "The knight wore shiny armor."},
    {"word": "grumpy", "definition": "In a bad mood and easily annoyed.", "example": "The grumpy dragon frowned."},
    {"word": "cheered", "definition": "Shouted with joy.", "example": "The crowd cheered loudly."}
  ],
  "decoyDefinitions": ["A small boat with oars.", "Very cold weather."]
}"#;

pub const PREDICTION_PAYLOAD: &str = r#"{
  "question": "What might happen next?",
  "predictions": [
    {"text": "Tom and the dragon become friends.", "plausibilityScore": 8, "rationale": "They shared lunch happily."},
    {"text": "The village throws a bread party.", "plausibilityScore": 6, "rationale": "Everyone cheered."},
    {"text": "The dragon takes the bread again.", "plausibilityScore": 3, "rationale": "He seemed happier at the end."},
    {"text": "Tom flies to the moon.", "plausibilityScore": 1, "rationale": "Nothing hints at space travel."}
  ]
}"#;

/// A well-formed payload for an activity type
pub fn payload_for(activity_type: ActivityType) -> &'static str {
    match activity_type {
        ActivityType::Who => WHO_PAYLOAD,
        ActivityType::Where => WHERE_PAYLOAD,
        ActivityType::Sequence => SEQUENCE_PAYLOAD,
        ActivityType::MainIdea => MAIN_IDEA_PAYLOAD,
        ActivityType::Vocabulary => VOCABULARY_PAYLOAD,
        ActivityType::Prediction => PREDICTION_PAYLOAD,
    }
}

/// Work out which activity a prompt asks for from its output schema
pub fn requested_type(prompt: &Prompt) -> ActivityType {
    let text = format!("{}\n{}", prompt.system, prompt.user);
    if text.contains("\"plausibilityScore\"") {
        ActivityType::Prediction
    } else if text.contains("\"decoyDefinitions\"") {
        ActivityType::Vocabulary
    } else if text.contains("\"options\"") {
        ActivityType::MainIdea
    } else if text.contains("\"events\"") {
        ActivityType::Sequence
    } else if text.contains("\"settings\"") {
        ActivityType::Where
    } else {
        ActivityType::Who
    }
}

pub const SCRIPTED_MODEL: &str = "scripted-model";

/// Answers every prompt with the matching well-formed payload
#[derive(Debug)]
pub struct PayloadClient {
    model: String,
    calls: AtomicUsize,
}

impl Default for PayloadClient {
    fn default() -> Self {
        Self::with_model(SCRIPTED_MODEL)
    }
}

impl PayloadClient {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for PayloadClient {
    async fn call(&self, prompt: &Prompt, _params: &ModelParameters) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(payload_for(requested_type(prompt)).to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Waits longer than any test timeout before answering
#[derive(Debug)]
pub struct SlowClient {
    pub delay: Duration,
    calls: AtomicUsize,
}

impl SlowClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for SlowClient {
    async fn call(&self, prompt: &Prompt, _params: &ModelParameters) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(payload_for(requested_type(prompt)).to_string())
    }

    fn model(&self) -> &str {
        SCRIPTED_MODEL
    }
}

/// Keeps every record for later assertions
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<CallRecord>>,
}

impl RecordingSink {
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl TelemetrySink for RecordingSink {
    fn record(&self, record: &CallRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}
