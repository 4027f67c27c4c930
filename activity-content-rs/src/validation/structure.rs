//! Schema checks per activity type
//!
//! Shared by the extraction strategies, which reject a parsed payload that
//! does not fit its schema, and by the content validator.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::content::{
    ActivityContent, Character, EventSequence, MainIdeaQuestion, PredictionSet, Setting,
    VocabularySet,
};
use crate::error::{GenerationError, Result};

pub const REAL_ITEMS: RangeInclusive<usize> = 2..=6;
pub const DECOY_ITEMS: RangeInclusive<usize> = 1..=4;
pub const EVENTS: RangeInclusive<usize> = 4..=6;
pub const MAIN_IDEA_OPTIONS: usize = 4;
pub const VOCABULARY_WORDS: RangeInclusive<usize> = 3..=6;
pub const DECOY_DEFINITIONS: RangeInclusive<usize> = 1..=6;
pub const PREDICTIONS: RangeInclusive<usize> = 4..=6;
pub const PLAUSIBILITY: RangeInclusive<u8> = 1..=10;

/// Check a payload against its activity schema
pub fn check(content: &ActivityContent) -> Result<()> {
    match content {
        ActivityContent::Characters(set) => {
            check_named("character", &names(&set.real), &names(&set.decoys))
        }
        ActivityContent::Settings(set) => check_named(
            "setting",
            &setting_names(&set.real),
            &setting_names(&set.decoys),
        ),
        ActivityContent::Events(seq) => check_events(seq),
        ActivityContent::MainIdea(q) => check_main_idea(q),
        ActivityContent::Vocabulary(set) => check_vocabulary_counts(set),
        ActivityContent::Predictions(set) => check_predictions(set),
    }
}

fn fail(message: impl Into<String>) -> Result<()> {
    Err(GenerationError::structural(message))
}

fn check_count(what: &str, actual: usize, range: &RangeInclusive<usize>) -> Result<()> {
    if range.contains(&actual) {
        Ok(())
    } else {
        fail(format!(
            "expected {}-{} {}, got {}",
            range.start(),
            range.end(),
            what,
            actual
        ))
    }
}

fn names(items: &[Character]) -> Vec<(&str, &str)> {
    items
        .iter()
        .map(|c| (c.name.as_str(), c.description.as_str()))
        .collect()
}

fn setting_names(items: &[Setting]) -> Vec<(&str, &str)> {
    items
        .iter()
        .map(|s| (s.name.as_str(), s.description.as_str()))
        .collect()
}

fn check_named(what: &str, real: &[(&str, &str)], decoys: &[(&str, &str)]) -> Result<()> {
    check_count(&format!("real {}s", what), real.len(), &REAL_ITEMS)?;
    check_count(&format!("decoy {}s", what), decoys.len(), &DECOY_ITEMS)?;

    let mut seen = HashSet::new();
    for (name, description) in real.iter().chain(decoys) {
        if name.trim().is_empty() || description.trim().is_empty() {
            return fail(format!("{} with an empty name or description", what));
        }
        if !seen.insert(name.trim().to_lowercase()) {
            return fail(format!("duplicate {} '{}'", what, name));
        }
    }
    Ok(())
}

fn check_events(seq: &EventSequence) -> Result<()> {
    check_count("events", seq.ordered.len(), &EVENTS)?;

    for (index, event) in seq.ordered.iter().enumerate() {
        let expected = index as u32 + 1;
        if event.id != expected {
            return fail(format!(
                "event ids must run 1..{}, found {} at position {}",
                seq.ordered.len(),
                event.id,
                expected
            ));
        }
        if event.description.trim().is_empty() {
            return fail(format!("event {} has no description", event.id));
        }
    }

    let mut shuffled = seq.shuffled.clone();
    shuffled.sort_by_key(|e| e.id);
    if shuffled != seq.ordered {
        return fail("shuffled events are not a permutation of the ordered events");
    }
    Ok(())
}

fn check_main_idea(q: &MainIdeaQuestion) -> Result<()> {
    if q.question.trim().is_empty() {
        return fail("main idea question is empty");
    }
    if q.options.len() != MAIN_IDEA_OPTIONS {
        return fail(format!(
            "expected exactly {} main idea options, got {}",
            MAIN_IDEA_OPTIONS,
            q.options.len()
        ));
    }

    let correct = q.options.iter().filter(|o| o.is_correct).count();
    if correct != 1 {
        return fail(format!("expected exactly one correct option, got {}", correct));
    }

    let mut seen = HashSet::new();
    for option in &q.options {
        if option.text.trim().is_empty() || option.rationale.trim().is_empty() {
            return fail("main idea option without text or rationale");
        }
        if !seen.insert(option.text.trim().to_lowercase()) {
            return fail(format!("duplicate main idea option '{}'", option.text));
        }
    }
    Ok(())
}

fn check_vocabulary_counts(set: &VocabularySet) -> Result<()> {
    check_count("vocabulary words", set.words.len(), &VOCABULARY_WORDS)?;
    check_count(
        "decoy definitions",
        set.decoy_definitions.len(),
        &DECOY_DEFINITIONS,
    )?;

    for word in &set.words {
        if word.word.trim().is_empty() || word.definition.trim().is_empty() {
            return fail("vocabulary entry without a word or definition");
        }
    }
    Ok(())
}

fn check_predictions(set: &PredictionSet) -> Result<()> {
    if set.question.trim().is_empty() {
        return fail("prediction question is empty");
    }
    check_count("predictions", set.predictions.len(), &PREDICTIONS)?;

    for prediction in &set.predictions {
        if !PLAUSIBILITY.contains(&prediction.plausibility_score) {
            return fail(format!(
                "plausibility score {} outside {}-{}",
                prediction.plausibility_score,
                PLAUSIBILITY.start(),
                PLAUSIBILITY.end()
            ));
        }
        if prediction.text.trim().is_empty() || prediction.rationale.trim().is_empty() {
            return fail("prediction without text or rationale");
        }
    }
    Ok(())
}
