use rand::RngCore;

use super::{prompt, ExtractionStrategy};
use crate::client::Prompt;
use crate::content::{ActivityContent, ActivityType, GenerationRequest, VocabularySet};
use crate::error::Result;

const TASK: &str = "Choose 3 to 6 words from the story that a reader of this age may not know. \
For each, write a definition as one complete sentence ending with a period that never uses the \
word itself or a form of it, and does not begin with phrases like \"a type of\" or \"a word \
that\". Add an example sentence showing the word in context. Then write 1 to 6 decoy \
definitions that match none of the chosen words, for a matching exercise.";

const SCHEMA: &str = r#"{
  "words": [{"word": "string", "definition": "string", "example": "string"}],
  "decoyDefinitions": ["string"]
}"#;

/// Vocabulary matching
#[derive(Debug, Clone, Copy, Default)]
pub struct VocabularyStrategy;

impl ExtractionStrategy for VocabularyStrategy {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Vocabulary
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Prompt {
        prompt::build(request, TASK, SCHEMA)
    }

    fn parse(&self, raw: &str, _rng: &mut dyn RngCore) -> Result<ActivityContent> {
        let mut set: VocabularySet = prompt::parse_payload(raw)?;

        for entry in &mut set.words {
            entry.word = prompt::clean(std::mem::take(&mut entry.word));
            entry.definition = prompt::clean(std::mem::take(&mut entry.definition));
            entry.example = prompt::clean(std::mem::take(&mut entry.example));
        }
        set.decoy_definitions = set
            .decoy_definitions
            .into_iter()
            .map(prompt::clean)
            .collect();

        Ok(ActivityContent::Vocabulary(set))
    }
}
