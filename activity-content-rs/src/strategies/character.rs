use rand::RngCore;
use serde::Deserialize;

use super::{prompt, ExtractionStrategy};
use crate::client::Prompt;
use crate::content::{ActivityContent, ActivityType, Character, CharacterSet, GenerationRequest};
use crate::error::Result;

const TASK: &str = "List the 2 to 6 most important characters in the story with a one-sentence \
description of each. Then invent 1 to 4 decoy characters who would fit the story but never \
appear in it, so a student can tell real characters from made-up ones.";

const SCHEMA: &str = r#"{
  "characters": [{"name": "string", "description": "string"}],
  "decoys": [{"name": "string", "description": "string"}]
}"#;

#[derive(Debug, Deserialize)]
struct Payload {
    characters: Vec<Character>,
    #[serde(default)]
    decoys: Vec<Character>,
}

/// Character identification ("who")
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterStrategy;

fn tidy(c: Character) -> Character {
    Character {
        name: prompt::clean(c.name),
        description: prompt::clean(c.description),
    }
}

impl ExtractionStrategy for CharacterStrategy {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Who
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Prompt {
        prompt::build(request, TASK, SCHEMA)
    }

    fn parse(&self, raw: &str, _rng: &mut dyn RngCore) -> Result<ActivityContent> {
        let payload: Payload = prompt::parse_payload(raw)?;

        Ok(ActivityContent::Characters(CharacterSet {
            real: payload.characters.into_iter().map(tidy).collect(),
            decoys: payload.decoys.into_iter().map(tidy).collect(),
        }))
    }
}
