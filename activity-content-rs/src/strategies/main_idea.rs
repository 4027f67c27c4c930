use rand::RngCore;

use super::{prompt, ExtractionStrategy};
use crate::client::Prompt;
use crate::content::{ActivityContent, ActivityType, GenerationRequest, MainIdeaQuestion};
use crate::error::Result;

const TASK: &str = "Write one question asking what the story is mostly about, with exactly 4 \
answer options. Exactly one option is correct and states the central idea of the whole story. \
The other three are tempting but wrong: a minor detail, an idea that is too broad, and an idea \
the story does not support. Give every option a one-sentence rationale.";

const SCHEMA: &str = r#"{
  "question": "string",
  "options": [{"text": "string", "isCorrect": true, "rationale": "string"}]
}"#;

/// Main-idea selection
#[derive(Debug, Clone, Copy, Default)]
pub struct MainIdeaStrategy;

impl ExtractionStrategy for MainIdeaStrategy {
    fn activity_type(&self) -> ActivityType {
        ActivityType::MainIdea
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Prompt {
        prompt::build(request, TASK, SCHEMA)
    }

    fn parse(&self, raw: &str, _rng: &mut dyn RngCore) -> Result<ActivityContent> {
        let mut question: MainIdeaQuestion = prompt::parse_payload(raw)?;

        question.question = prompt::clean(question.question);
        for option in &mut question.options {
            option.text = prompt::clean(std::mem::take(&mut option.text));
            option.rationale = prompt::clean(std::mem::take(&mut option.rationale));
        }

        Ok(ActivityContent::MainIdea(question))
    }
}
