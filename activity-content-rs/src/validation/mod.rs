//! Age-appropriateness and structural validation of activity content
//!
//! Checks run in a fixed order and stop at the first failure:
//! 1. globally banned terms
//! 2. age-band banned terms
//! 3. minimum text length
//! 4. token repetition ratio
//! 5. per-type schema (see [`structure`])
//! 6. vocabulary definition quality

pub mod structure;
pub mod terms;

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::content::{ActivityContent, VocabularySet};
use crate::error::{GenerationError, Result};

/// Minimum characters of student-facing text
pub const MIN_TEXT_CHARS: usize = 30;

/// Unique tokens must make up at least this share of all tokens
pub const MIN_UNIQUE_TOKEN_RATIO: f64 = 0.3;

const BOILERPLATE_OPENINGS: &[&str] = &[
    "a type of",
    "a kind of",
    "a word that",
    "a word for",
    "a word used",
    "something related to",
    "related to",
];

/// How serious a validation failure is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Outcome of validating one payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Rejected by a banned-term list rather than by shape or quality
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub banned_term: bool,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
            severity: None,
            banned_term: false,
        }
    }

    pub fn invalid(reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
            severity: Some(severity),
            banned_term: false,
        }
    }

    /// A rejection caused by a banned term
    pub fn banned(reason: impl Into<String>, severity: Severity) -> Self {
        Self {
            banned_term: true,
            ..Self::invalid(reason, severity)
        }
    }

    /// Convert a failed validation into a regenerable pipeline error
    ///
    /// Banned-term hits become content-filter errors, everything else a
    /// structural failure.
    pub fn into_result(self) -> Result<()> {
        if self.is_valid {
            return Ok(());
        }
        let reason = self.reason.unwrap_or_else(|| "content rejected".to_string());
        let error = if self.banned_term {
            GenerationError::content_filter(reason)
        } else {
            GenerationError::structural(reason)
        };
        Err(error.with_context_value(
            "severity",
            self.severity.unwrap_or(Severity::Medium),
        ))
    }
}

/// Validates candidate content before it is accepted
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentValidator;

impl ContentValidator {
    pub fn new() -> Self {
        Self
    }

    /// Run every check against `content` for a learner of `age_years`
    pub fn validate(&self, content: &ActivityContent, age_years: u8) -> ValidationResult {
        let fragments = content.text_fragments();
        let text = fragments.join(" ");

        if let Some(term) = terms::GLOBAL.find(&text) {
            return ValidationResult::banned(
                format!("banned term '{}'", term),
                terms::GLOBAL.severity(),
            );
        }

        if let Some(list) = terms::for_age(age_years) {
            if let Some(term) = list.find(&text) {
                return ValidationResult::banned(
                    format!("banned term '{}' for {}", term, list.name()),
                    list.severity(),
                );
            }
        }

        if text.trim().chars().count() < MIN_TEXT_CHARS {
            return ValidationResult::invalid("content is too short", Severity::Medium);
        }

        let tokens = tokenize(&text);
        if !tokens.is_empty() {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            let ratio = unique.len() as f64 / tokens.len() as f64;
            if ratio < MIN_UNIQUE_TOKEN_RATIO {
                return ValidationResult::invalid(
                    format!("content is repetitive ({:.0}% unique tokens)", ratio * 100.0),
                    Severity::Medium,
                );
            }
        }

        if let Err(err) = structure::check(content) {
            return ValidationResult::invalid(err.to_string(), Severity::Medium);
        }

        if let ActivityContent::Vocabulary(set) = content {
            if let Some(result) = check_vocabulary_quality(set) {
                return result;
            }
        }

        ValidationResult::valid()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn is_circular(word: &str, definition: &str) -> bool {
    let headword = word.trim().to_lowercase();
    if headword.is_empty() {
        return false;
    }

    // Compound headwords ("well-known", "ice cream") do not survive tokenizing
    if !headword.chars().all(char::is_alphanumeric) {
        return Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(&headword)))
            .map(|pattern| pattern.is_match(definition))
            .unwrap_or_else(|_| definition.to_lowercase().contains(&headword));
    }

    tokenize(definition).iter().any(|token| {
        token == &headword || (headword.chars().count() >= 4 && token.starts_with(&headword))
    })
}

fn check_vocabulary_quality(set: &VocabularySet) -> Option<ValidationResult> {
    let mut seen = HashSet::new();

    for entry in &set.words {
        let word = entry.word.trim();
        let definition = entry.definition.trim();

        if !seen.insert(word.to_lowercase()) {
            return Some(ValidationResult::invalid(
                format!("duplicate vocabulary word '{}'", word),
                Severity::Medium,
            ));
        }

        if is_circular(word, definition) {
            return Some(ValidationResult::invalid(
                format!("definition of '{}' uses the word itself", word),
                Severity::Medium,
            ));
        }

        if !definition.ends_with(|c| matches!(c, '.' | '!' | '?')) {
            return Some(ValidationResult::invalid(
                format!("definition of '{}' is not a complete sentence", word),
                Severity::Low,
            ));
        }

        let lower = definition.to_lowercase();
        if let Some(opening) = BOILERPLATE_OPENINGS.iter().find(|o| lower.starts_with(*o)) {
            return Some(ValidationResult::invalid(
                format!("definition of '{}' opens with '{}'", word, opening),
                Severity::Low,
            ));
        }
    }

    None
}
