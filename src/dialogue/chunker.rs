//! Packing whole turns into synthesis-sized chunks.
//!
//! A turn is never split: splitting mid-turn would detach the second half
//! from its `Speaker N:` label and break speaker attribution in the
//! synthesis call.  A turn that cannot fit on its own is a hard error.

use thiserror::Error;

use crate::dialogue::turns::Turn;
use crate::text::segment::GreedyPacker;
use crate::text::tokens::estimate_turn_tokens;

/// A single turn is larger than the per-request ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("turn by {speaker} is ~{tokens} tokens, over the {max_tokens}-token ceiling")]
pub struct OversizedTurn {
    pub speaker: String,
    pub tokens: usize,
    pub max_tokens: usize,
}

/// Pack `turns` greedily into chunks of at most `max_tokens`
/// ([`estimate_turn_tokens`], plus one token per joining space).
///
/// Turn texts are joined with a single space; the labels embedded in each
/// turn carry the structure.  Fails without emitting anything if any turn
/// alone is over the ceiling.
pub fn chunk_turns(turns: &[Turn], max_tokens: usize) -> Result<Vec<String>, OversizedTurn> {
    let mut packer = GreedyPacker::new(max_tokens);

    for turn in turns {
        let tokens = estimate_turn_tokens(&turn.text);
        if tokens > max_tokens {
            return Err(OversizedTurn {
                speaker: turn.speaker.clone(),
                tokens,
                max_tokens,
            });
        }
        packer.push(turn.text.clone(), tokens);
    }

    Ok(packer.finish())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::turns::parse_turns;

    fn turn(speaker: u32, body: &str) -> Turn {
        let speaker = format!("Speaker {speaker}");
        Turn {
            text: format!("{speaker}: {body}"),
            speaker,
        }
    }

    #[test]
    fn short_dialogue_is_one_chunk() {
        let turns = parse_turns("Speaker 1: Hello there.\nSpeaker 2: Hi!\nSpeaker 1: How are you?");
        let chunks = chunk_turns(&turns, 2400).unwrap();
        assert_eq!(
            chunks,
            vec!["Speaker 1: Hello there. Speaker 2: Hi! Speaker 1: How are you?"]
        );
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_turns(&[], 100).unwrap().is_empty());
    }

    #[test]
    fn oversized_turn_names_the_speaker() {
        // 629 chars → ceil(629 / 4.2) = 150 tokens.
        let turns = vec![turn(1, "short"), turn(2, &"w".repeat(629))];
        let err = chunk_turns(&turns, 100).unwrap_err();
        assert_eq!(
            err,
            OversizedTurn {
                speaker: "Speaker 2".into(),
                tokens: 150,
                max_tokens: 100,
            }
        );
        assert!(err.to_string().contains("Speaker 2"));
    }

    #[test]
    fn turns_are_never_split() {
        let turns: Vec<Turn> = (0..20)
            .map(|i| turn(1 + i % 2, &format!("utterance {i} {}", "y".repeat(10 + i as usize * 3))))
            .collect();
        let chunks = chunk_turns(&turns, 40).unwrap();
        assert!(chunks.len() > 1);

        for t in &turns {
            let holders = chunks.iter().filter(|c| c.contains(&t.text)).count();
            assert_eq!(holders, 1, "turn {:?} must sit whole in exactly one chunk", t.text);
        }
        for chunk in &chunks {
            assert!(chunk.starts_with("Speaker "), "chunk must open on a label: {chunk}");
        }
        let rejoined = chunks.join(" ");
        let expected = turns.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
        assert_eq!(rejoined, expected);
    }

    #[test]
    fn exact_ceiling_is_inclusive() {
        // Bodies of 42 chars → 10 tokens each; 10 + 10 + 1 = 21.
        let turns = vec![turn(1, &"a".repeat(42)), turn(2, &"b".repeat(42))];
        assert_eq!(chunk_turns(&turns, 21).unwrap().len(), 1);
        assert_eq!(chunk_turns(&turns, 20).unwrap().len(), 2);
    }
}
