//! Prompt scaffolding and payload extraction shared by the strategies

use serde::de::DeserializeOwned;

use crate::client::Prompt;
use crate::content::GenerationRequest;
use crate::error::{GenerationError, Result};
use crate::util::truncate_string;

const SYSTEM_CONTRACT: &str = "You are an educational content designer who writes reading \
activities for children. Respond with a single JSON object and nothing else: no markdown, no \
code fences, no commentary. Use exactly the field names given. Every value must be grounded in \
the story provided. Keep all text kind, calm and suitable for a school classroom.";

const STRICT_REMINDER: &str = "Your previous answer could not be used. Follow the schema \
exactly, respect every count, write every string as plain text, and return only the JSON object.";

/// Reading-level guidance for a learner's age
pub fn reading_level(age_years: u8) -> &'static str {
    match age_years {
        0..=6 => "very short sentences and the simplest everyday words",
        7..=8 => "short sentences and common words a second grader knows",
        9..=10 => "clear sentences and vocabulary for a fourth grader",
        11..=12 => "vocabulary and sentence length suited to a sixth grader",
        _ => "language suited to a young teenager",
    }
}

/// Assemble a prompt from a task description and a JSON schema example
pub fn build(request: &GenerationRequest, task: &str, schema: &str) -> Prompt {
    let mut system = SYSTEM_CONTRACT.to_string();
    if request.is_regeneration() {
        system.push(' ');
        system.push_str(STRICT_REMINDER);
    }

    let user = format!(
        "Reader age: {age} years. Use {level}.\n\n\
         Task: {task}\n\n\
         Return JSON in exactly this shape:\n{schema}\n\n\
         Story:\n\"\"\"\n{story}\n\"\"\"",
        age = request.age_years,
        level = reading_level(request.age_years),
        task = task,
        schema = schema,
        story = request.source_text.trim(),
    );

    Prompt::new(system, user)
}

/// Locate the JSON object in a completion
///
/// Tolerates code fences and chatter around the object by taking the span
/// from the first `{` to the last `}`.
pub fn extract_json(raw: &str) -> Result<&str> {
    let start = raw.find('{');
    let end = raw.rfind('}');

    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&raw[start..=end]),
        _ => Err(GenerationError::parsing(format!(
            "no JSON object in response: {}",
            truncate_string(raw.trim(), 120)
        ))),
    }
}

/// Parse the JSON object in a completion into a payload type
pub fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let json = extract_json(raw)?;
    serde_json::from_str(json).map_err(|e| {
        GenerationError::parsing(format!("response does not match the expected schema: {}", e))
    })
}

/// Trim a model-provided string
pub fn clean(text: String) -> String {
    let trimmed = text.trim();
    if trimmed.len() == text.len() {
        text
    } else {
        trimmed.to_string()
    }
}
