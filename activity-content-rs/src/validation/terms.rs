//! Banned-term lists for age-appropriate content
//!
//! Terms match case-insensitively on word boundaries, so "skill" never
//! matches "kill".

use once_cell::sync::Lazy;
use regex::Regex;

use super::Severity;

/// Terms never allowed in content for any age
const GLOBAL_TERMS: &[&str] = &[
    "violent",
    "violence",
    "kill",
    "kills",
    "killed",
    "killing",
    "murder",
    "murders",
    "murdered",
    "murderer",
    "blood",
    "bloody",
    "gore",
    "gory",
    "torture",
    "tortured",
    "suicide",
    "drug",
    "drugs",
    "cocaine",
    "heroin",
    "sex",
    "sexual",
    "sexy",
    "naked",
    "nude",
    "porn",
    "rape",
    "shit",
    "fuck",
    "bitch",
    "bastard",
];

/// Extra terms for ages 9 to 12
const PRETEEN_TERMS: &[&str] = &[
    "alcohol", "beer", "wine", "drunk", "cigarette", "cigarettes", "gun", "guns", "horror",
];

/// Extra terms for ages 8 and below
const YOUNG_CHILD_TERMS: &[&str] = &[
    "alcohol",
    "beer",
    "wine",
    "drunk",
    "cigarette",
    "cigarettes",
    "gun",
    "guns",
    "horror",
    "dead",
    "death",
    "die",
    "died",
    "dying",
    "weapon",
    "weapons",
    "knife",
    "knives",
    "terrifying",
    "nightmare",
    "hate",
    "stupid",
];

/// A compiled list of banned terms
pub struct TermList {
    name: &'static str,
    pattern: Option<Regex>,
    severity: Severity,
}

impl TermList {
    fn new(name: &'static str, terms: &[&str], severity: Severity) -> Self {
        let alternation = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).ok();
        if pattern.is_none() {
            log::error!("Banned-term list '{}' failed to compile", name);
        }

        Self {
            name,
            pattern,
            severity,
        }
    }

    /// The first banned term found in `text`, if any
    pub fn find(&self, text: &str) -> Option<String> {
        self.pattern
            .as_ref()
            .and_then(|re| re.find(text))
            .map(|m| m.as_str().to_lowercase())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }
}

pub static GLOBAL: Lazy<TermList> =
    Lazy::new(|| TermList::new("global", GLOBAL_TERMS, Severity::High));

pub static YOUNG_CHILD: Lazy<TermList> =
    Lazy::new(|| TermList::new("ages 8 and under", YOUNG_CHILD_TERMS, Severity::High));

pub static PRETEEN: Lazy<TermList> =
    Lazy::new(|| TermList::new("ages 9-12", PRETEEN_TERMS, Severity::Medium));

/// The age-band list that applies to a learner, if any
pub fn for_age(age_years: u8) -> Option<&'static TermList> {
    match age_years {
        0..=8 => Some(&*YOUNG_CHILD),
        9..=12 => Some(&*PRETEEN),
        _ => None,
    }
}
