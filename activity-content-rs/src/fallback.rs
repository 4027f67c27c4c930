//! Static content returned when generation cannot produce valid output
//!
//! Templates are deterministic, suitable for any age and satisfy the same
//! schema and validation rules as generated content, so callers never need
//! to special-case them. Results built from them carry
//! [`ContentOrigin::Fallback`](crate::content::ContentOrigin::Fallback).

use crate::content::{
    ActivityContent, ActivityType, Character, CharacterSet, Event, EventSequence, MainIdeaOption,
    MainIdeaQuestion, Prediction, PredictionSet, Setting, SettingSet, StorySegment, VocabularySet,
    VocabularyWord,
};

/// Name of the first character in the character template
pub const FALLBACK_CHARACTER_NAME: &str = "Maya";

/// Per-activity-type canned content
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackLibrary;

impl FallbackLibrary {
    pub fn new() -> Self {
        Self
    }

    /// The template for an activity type
    pub fn template(&self, activity_type: ActivityType) -> ActivityContent {
        match activity_type {
            ActivityType::Who => characters(),
            ActivityType::Where => settings(),
            ActivityType::Sequence => events(),
            ActivityType::MainIdea => main_idea(),
            ActivityType::Vocabulary => vocabulary(),
            ActivityType::Prediction => predictions(),
        }
    }
}

fn character(name: &str, description: &str) -> Character {
    Character {
        name: name.to_string(),
        description: description.to_string(),
    }
}

fn setting(name: &str, description: &str) -> Setting {
    Setting {
        name: name.to_string(),
        description: description.to_string(),
    }
}

fn characters() -> ActivityContent {
    ActivityContent::Characters(CharacterSet {
        real: vec![
            character(
                FALLBACK_CHARACTER_NAME,
                "A curious girl who loves to explore and ask questions.",
            ),
            character(
                "Sam",
                "Maya's loyal friend who always helps when things get tricky.",
            ),
        ],
        decoys: vec![character(
            "Captain Finn",
            "A sailor with a green hat who is not part of this story.",
        )],
    })
}

fn settings() -> ActivityContent {
    ActivityContent::Settings(SettingSet {
        real: vec![
            setting(
                "The park",
                "A sunny green park with tall trees and a small pond.",
            ),
            setting(
                "Maya's house",
                "A cozy home with a bright kitchen and a reading corner.",
            ),
        ],
        decoys: vec![setting(
            "The moon base",
            "A station on the moon that the story never visits.",
        )],
    })
}

fn events() -> ActivityContent {
    let event = |id: u32, description: &str, segment| Event {
        id,
        description: description.to_string(),
        segment,
    };

    let ordered = vec![
        event(1, "The main character notices a problem.", StorySegment::Beginning),
        event(2, "She tries to fix it on her own.", StorySegment::Middle),
        event(3, "A friend shares a new idea.", StorySegment::Middle),
        event(4, "Together they solve the problem and celebrate.", StorySegment::End),
    ];
    let shuffled = [2, 0, 3, 1].iter().map(|&i| ordered[i].clone()).collect();

    ActivityContent::Events(EventSequence { ordered, shuffled })
}

fn main_idea() -> ActivityContent {
    let option = |text: &str, is_correct, rationale: &str| MainIdeaOption {
        text: text.to_string(),
        is_correct,
        rationale: rationale.to_string(),
    };

    ActivityContent::MainIdea(MainIdeaQuestion {
        question: "What is this story mostly about?".to_string(),
        options: vec![
            option(
                "Friends working together to solve a problem",
                true,
                "The whole story builds toward the characters solving the problem as a team.",
            ),
            option(
                "The color of the main character's shoes",
                false,
                "This is a small detail, not what the story is about.",
            ),
            option(
                "Everything that ever happened in the town",
                false,
                "This is far too broad for one short story.",
            ),
            option(
                "A race between two cars",
                false,
                "Nothing in the story talks about cars racing.",
            ),
        ],
    })
}

fn vocabulary() -> ActivityContent {
    let word = |word: &str, definition: &str, example: &str| VocabularyWord {
        word: word.to_string(),
        definition: definition.to_string(),
        example: example.to_string(),
    };

    ActivityContent::Vocabulary(VocabularySet {
        words: vec![
            word(
                "explore",
                "To travel around a place to learn about it.",
                "Maya likes to explore the park after school.",
            ),
            word(
                "curious",
                "Wanting to know or learn about something.",
                "The curious puppy sniffed every flower.",
            ),
            word(
                "cozy",
                "Warm, comfortable and safe.",
                "The reading corner felt cozy on a rainy day.",
            ),
        ],
        decoy_definitions: vec![
            "Very loud and full of noise.".to_string(),
            "Made of ice or snow.".to_string(),
        ],
    })
}

fn predictions() -> ActivityContent {
    let prediction = |text: &str, plausibility_score, rationale: &str| Prediction {
        text: text.to_string(),
        plausibility_score,
        rationale: rationale.to_string(),
    };

    ActivityContent::Predictions(PredictionSet {
        question: "What do you think will happen next?".to_string(),
        predictions: vec![
            prediction(
                "The friends plan another adventure together.",
                8,
                "They had fun and worked well as a team.",
            ),
            prediction(
                "The main character tells her family what she learned.",
                6,
                "She is excited and likes to share.",
            ),
            prediction(
                "They forget about each other by tomorrow.",
                3,
                "The story shows they care about their friendship.",
            ),
            prediction(
                "A talking rainbow asks them to fly to space.",
                1,
                "Nothing in the story hints at magic.",
            ),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{structure, ContentValidator};
    use std::collections::HashSet;

    #[test]
    fn test_templates_match_their_types() {
        let library = FallbackLibrary::new();
        for activity_type in ActivityType::ALL {
            assert_eq!(library.template(activity_type).activity_type(), activity_type);
        }
    }

    #[test]
    fn test_templates_pass_validation_for_every_age() {
        let library = FallbackLibrary::new();
        let validator = ContentValidator::new();

        for activity_type in ActivityType::ALL {
            let content = library.template(activity_type);
            assert!(structure::check(&content).is_ok(), "{}", activity_type);
            for age in 4..=16 {
                let result = validator.validate(&content, age);
                assert!(result.is_valid, "{} at age {}: {:?}", activity_type, age, result);
            }
        }
    }

    #[test]
    fn test_template_shapes() {
        let library = FallbackLibrary::new();

        let ActivityContent::Characters(set) = library.template(ActivityType::Who) else {
            panic!("expected characters");
        };
        assert_eq!(set.real[0].name, FALLBACK_CHARACTER_NAME);
        assert_eq!((set.real.len(), set.decoys.len()), (2, 1));

        let ActivityContent::Predictions(set) = library.template(ActivityType::Prediction) else {
            panic!("expected predictions");
        };
        let scores: HashSet<u8> = set.predictions.iter().map(|p| p.plausibility_score).collect();
        assert_eq!(scores.len(), 4);

        let ActivityContent::Vocabulary(set) = library.template(ActivityType::Vocabulary) else {
            panic!("expected vocabulary");
        };
        assert_eq!((set.words.len(), set.decoy_definitions.len()), (3, 2));
    }
}
