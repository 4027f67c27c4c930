//! Activity content payloads
//!
//! One struct per activity shape, unified by the [`ActivityContent`] tagged
//! union. Field names serialize in camelCase, the union carries its variant
//! in a `"type"` field.

use serde::{Deserialize, Serialize};

use super::ActivityType;

/// A story character, real or decoy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub description: String,
}

/// Characters found in the story plus plausible but absent decoys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSet {
    pub real: Vec<Character>,
    pub decoys: Vec<Character>,
}

/// A story setting, real or decoy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingSet {
    pub real: Vec<Setting>,
    pub decoys: Vec<Setting>,
}

/// Part of the source text an event was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorySegment {
    Beginning,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Chronological position, starting at 1
    pub id: u32,
    pub description: String,
    pub segment: StorySegment,
}

/// Events in story order, plus the same events in presentation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSequence {
    pub ordered: Vec<Event>,
    pub shuffled: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainIdeaOption {
    pub text: String,
    pub is_correct: bool,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainIdeaQuestion {
    pub question: String,
    pub options: Vec<MainIdeaOption>,
}

impl MainIdeaQuestion {
    /// The option marked correct, if exactly one is
    pub fn correct_option(&self) -> Option<&MainIdeaOption> {
        let mut correct = self.options.iter().filter(|o| o.is_correct);
        match (correct.next(), correct.next()) {
            (Some(option), None) => Some(option),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub word: String,
    pub definition: String,
    /// Sentence showing the word in context
    pub example: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularySet {
    pub words: Vec<VocabularyWord>,
    pub decoy_definitions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub text: String,
    /// 1 (unlikely) to 10 (very likely)
    pub plausibility_score: u8,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSet {
    pub question: String,
    pub predictions: Vec<Prediction>,
}

/// Content for one interactive reading activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActivityContent {
    Characters(CharacterSet),
    Settings(SettingSet),
    Events(EventSequence),
    MainIdea(MainIdeaQuestion),
    Vocabulary(VocabularySet),
    Predictions(PredictionSet),
}

impl ActivityContent {
    /// The activity type this content belongs to
    pub fn activity_type(&self) -> ActivityType {
        match self {
            ActivityContent::Characters(_) => ActivityType::Who,
            ActivityContent::Settings(_) => ActivityType::Where,
            ActivityContent::Events(_) => ActivityType::Sequence,
            ActivityContent::MainIdea(_) => ActivityType::MainIdea,
            ActivityContent::Vocabulary(_) => ActivityType::Vocabulary,
            ActivityContent::Predictions(_) => ActivityType::Prediction,
        }
    }

    /// Every piece of student-facing text in the content
    pub fn text_fragments(&self) -> Vec<&str> {
        let mut out = Vec::new();
        match self {
            ActivityContent::Characters(set) => {
                for c in set.real.iter().chain(&set.decoys) {
                    out.push(c.name.as_str());
                    out.push(c.description.as_str());
                }
            }
            ActivityContent::Settings(set) => {
                for s in set.real.iter().chain(&set.decoys) {
                    out.push(s.name.as_str());
                    out.push(s.description.as_str());
                }
            }
            ActivityContent::Events(seq) => {
                out.extend(seq.ordered.iter().map(|e| e.description.as_str()));
            }
            ActivityContent::MainIdea(q) => {
                out.push(q.question.as_str());
                for o in &q.options {
                    out.push(o.text.as_str());
                    out.push(o.rationale.as_str());
                }
            }
            ActivityContent::Vocabulary(set) => {
                for w in &set.words {
                    out.push(w.word.as_str());
                    out.push(w.definition.as_str());
                    out.push(w.example.as_str());
                }
                out.extend(set.decoy_definitions.iter().map(String::as_str));
            }
            ActivityContent::Predictions(set) => {
                out.push(set.question.as_str());
                for p in &set.predictions {
                    out.push(p.text.as_str());
                    out.push(p.rationale.as_str());
                }
            }
        }
        out
    }

    /// Length of the JSON serialization, in bytes
    pub fn serialized_len(&self) -> usize {
        serde_json::to_string(self).map(|s| s.len()).unwrap_or(0)
    }
}
