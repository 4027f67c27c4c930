use rand::seq::SliceRandom;
use rand::RngCore;
use serde::Deserialize;

use super::{prompt, ExtractionStrategy};
use crate::client::Prompt;
use crate::content::{
    ActivityContent, ActivityType, Event, EventSequence, GenerationRequest, StorySegment,
};
use crate::error::{GenerationError, Result};

const TASK: &str = "Pick 4 to 6 key events that span the whole story, from its opening to its \
ending, not just the first paragraphs. List them in strict chronological order with ids \
starting at 1. Tag each event with the part of the story it comes from: \"beginning\", \
\"middle\" or \"end\".";

const SCHEMA: &str = r#"{
  "events": [{"id": 1, "description": "string", "segment": "beginning|middle|end"}]
}"#;

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: u32,
    description: String,
    #[serde(default)]
    segment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Payload {
    events: Vec<RawEvent>,
}

fn parse_segment(value: Option<&str>, position: usize, total: usize) -> Result<StorySegment> {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if v == "beginning" || v == "start" => Ok(StorySegment::Beginning),
        Some(v) if v == "middle" => Ok(StorySegment::Middle),
        Some(v) if v == "end" || v == "ending" => Ok(StorySegment::End),
        Some(v) => Err(GenerationError::parsing(format!("unknown story segment '{}'", v))),
        // Derive from position when the model leaves it out
        None => Ok(match position * 3 / total.max(1) {
            0 => StorySegment::Beginning,
            1 => StorySegment::Middle,
            _ => StorySegment::End,
        }),
    }
}

/// Event sequencing
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceStrategy;

impl ExtractionStrategy for SequenceStrategy {
    fn activity_type(&self) -> ActivityType {
        ActivityType::Sequence
    }

    fn build_prompt(&self, request: &GenerationRequest) -> Prompt {
        prompt::build(request, TASK, SCHEMA)
    }

    fn parse(&self, raw: &str, rng: &mut dyn RngCore) -> Result<ActivityContent> {
        let mut payload: Payload = prompt::parse_payload(raw)?;
        payload.events.sort_by_key(|e| e.id);

        let total = payload.events.len();
        let ordered = payload
            .events
            .into_iter()
            .enumerate()
            .map(|(position, e)| {
                Ok(Event {
                    id: e.id,
                    segment: parse_segment(e.segment.as_deref(), position, total)?,
                    description: prompt::clean(e.description),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut shuffled = ordered.clone();
        shuffled.shuffle(rng);

        Ok(ActivityContent::Events(EventSequence { ordered, shuffled }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const RAW: &str = r#"{"events":[
        {"id":2,"description":"He put on his armor.","segment":"beginning"},
        {"id":1,"description":"The knight woke up.","segment":"Beginning"},
        {"id":3,"description":"He fought the dragon.","segment":"middle"},
        {"id":4,"description":"He saved the kingdom.","segment":"end"}]}"#;

    #[test]
    fn test_orders_by_id_and_shuffles_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let content = SequenceStrategy.parse(RAW, &mut rng).unwrap();

        let ActivityContent::Events(seq) = content else {
            panic!("expected events");
        };
        let ids: Vec<u32> = seq.ordered.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(seq.ordered[0].segment, StorySegment::Beginning);

        let mut shuffled = seq.shuffled.clone();
        shuffled.sort_by_key(|e| e.id);
        assert_eq!(shuffled, seq.ordered);
    }

    #[test]
    fn test_same_seed_same_shuffle() {
        let a = SequenceStrategy.parse(RAW, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = SequenceStrategy.parse(RAW, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_segment_is_derived() {
        let raw = r#"{"events":[{"id":1,"description":"a"},{"id":2,"description":"b"},
            {"id":3,"description":"c"}]}"#;
        let ActivityContent::Events(seq) =
            SequenceStrategy.parse(raw, &mut StdRng::seed_from_u64(1)).unwrap()
        else {
            panic!("expected events");
        };
        assert_eq!(seq.ordered[0].segment, StorySegment::Beginning);
        assert_eq!(seq.ordered[1].segment, StorySegment::Middle);
        assert_eq!(seq.ordered[2].segment, StorySegment::End);
    }

    #[test]
    fn test_unknown_segment_is_parse_failure() {
        let raw = r#"{"events":[{"id":1,"description":"a","segment":"prologue"}]}"#;
        assert!(SequenceStrategy
            .parse(raw, &mut StdRng::seed_from_u64(1))
            .is_err());
    }
}
