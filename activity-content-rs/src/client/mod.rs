//! Generation client abstraction
//!
//! The pipeline talks to the external language model only through
//! [`GenerationClient`]. The crate ships an OpenAI-compatible implementation
//! in [`openai`]; tests substitute mocks or scripted clients.

pub mod openai;
pub mod telemetry;

pub use openai::{OpenAIGenerationClient, OpenAIGenerationClientBuilder};
pub use telemetry::{CallOutcome, CallRecord, LogTelemetrySink, NoopTelemetrySink, TelemetrySink};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::ModelParameters;
use crate::error::Result;

/// A request to the generation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Output contract and role instructions
    pub system: String,

    /// Task-specific instructions including the source text
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Characters sent to the service
    pub fn input_size(&self) -> usize {
        self.system.chars().count() + self.user.chars().count()
    }
}

/// A client for the external generative language model
///
/// Implementations return the raw completion text, or fail with one of the
/// classified error kinds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn call(&self, prompt: &Prompt, params: &ModelParameters) -> Result<String>;

    /// Model this client sends requests to, as reported in telemetry
    fn model(&self) -> &str;
}
