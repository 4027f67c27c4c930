use rand::RngCore;
use serde::Deserialize;

use super::{prompt, ExtractionStrategy};
use crate::client::Prompt;
use crate::content::{ActivityContent, ActivityType, GenerationRequest, Setting, SettingSet};
use crate::error::Result;

const TASK: &str = "List the 2 to 6 places where the story happens, each with a one-sentence \
description a student could picture. Then invent 1 to 4 decoy places that sound like they could \
belong to the story but are never visited in it.";

const SCHEMA: &str = r#"{
  "settings": [{"name": "string", "description": "string"}],
  "decoys": [{"name": "string", "description": "string"}]
}"#;

#[derive(Debug, Deserialize)]
struct Payload {
    settings: Vec<Setting>,
    #[serde(default)]
    decoys: Vec<Setting>,
}

/// Setting identification ("where")
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingStrategy;

fn tidy(s: Setting) -> Setting {
    Setting {
        name: prompt::clean(s.name),
        description: prompt::clean(s.description),
    }
}

impl ExtractionStrategy for SettingStrategy {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Where
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Prompt {
        prompt::build(request, TASK, SCHEMA)
    }

    fn parse(&self, raw: &str, _rng: &mut dyn RngCore) -> Result<ActivityContent> {
        let payload: Payload = prompt::parse_payload(raw)?;

        Ok(ActivityContent::Settings(SettingSet {
            real: payload.settings.into_iter().map(tidy).collect(),
            decoys: payload.decoys.into_iter().map(tidy).collect(),
        }))
    }
}
