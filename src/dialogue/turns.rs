//! Two-speaker script parsing.
//!
//! A script follows the line-oriented `Speaker N: ...` convention produced by
//! the script generator in two-speaker mode:
//!
//! ```text
//! Speaker 1: Welcome back to the show.
//! Today we're talking about rivers.        ← continuation of Speaker 1
//! Speaker 2： Sounds great!                ← full-width colon is accepted
//! ```
//!
//! Each [`Turn`] keeps its label re-prefixed onto the body, because the
//! chunked text is sent verbatim to the synthesis call, which attributes
//! speakers from those embedded labels.

use std::sync::LazyLock;

use regex::Regex;

/// A line that opens a new turn.  Group 1 is the speaker number, group 2 the
/// first line of the utterance.
static TURN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*Speaker\s*(\d+)\s*[:：]\s*(.*)$").expect("turn label pattern is valid")
});

/// One speaker's contiguous utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Canonical label, e.g. `"Speaker 1"`.
    pub speaker: String,
    /// `"<speaker>: <body>"`.
    pub text: String,
}

impl Turn {
    fn from_lines(speaker: String, lines: &[&str]) -> Self {
        let text = format!("{speaker}: {}", lines.join(" ").trim());
        Self { speaker, text }
    }

    /// The utterance without its `"<speaker>: "` prefix.
    pub fn body(&self) -> &str {
        self.text
            .strip_prefix(self.speaker.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
            .map(str::trim_start)
            .unwrap_or(&self.text)
    }
}

/// Normalise a dialogue script: non-breaking and zero-width-no-break spaces
/// become plain spaces, runs of spaces/tabs collapse, ends are trimmed.
pub fn normalize_dialogue(script: &str) -> String {
    let replaced: String = script
        .chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{202F}' | '\u{FEFF}' => ' ',
            other => other,
        })
        .collect();
    crate::text::normalize_spaces(&replaced)
}

/// Parse `script` into turns, in document order.
///
/// Blank lines are ignored.  Lines before the first label are discarded.
/// Labels are canonicalised to `"Speaker <digits>"` whatever their case or
/// spacing.  Returns an empty vector when no line carries a label.
///
/// ```rust
/// use podcast_gen::dialogue::parse_turns;
///
/// let turns = parse_turns("speaker 1: Hi.\nspeaker2: Hello!");
/// assert_eq!(turns[1].speaker, "Speaker 2");
/// assert_eq!(turns[1].text, "Speaker 2: Hello!");
/// ```
pub fn parse_turns(script: &str) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in script.lines().filter(|l| !l.trim().is_empty()) {
        if let Some(caps) = TURN_LABEL.captures(line) {
            if let Some((speaker, lines)) = current.take() {
                turns.push(Turn::from_lines(speaker, &lines));
            }
            let number = caps.get(1).map_or("", |m| m.as_str());
            let first = caps.get(2).map_or("", |m| m.as_str());
            current = Some((format!("Speaker {number}"), vec![first]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line.trim());
        }
    }

    if let Some((speaker, lines)) = current {
        turns.push(Turn::from_lines(speaker, &lines));
    }

    turns
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_turns_in_order() {
        let turns = parse_turns("Speaker 1: Hello there.\nSpeaker 2: Hi!\nSpeaker 1: How are you?");
        let speakers: Vec<&str> = turns.iter().map(|t| t.speaker.as_str()).collect();
        assert_eq!(speakers, vec!["Speaker 1", "Speaker 2", "Speaker 1"]);
        assert_eq!(turns[0].text, "Speaker 1: Hello there.");
        assert_eq!(turns[2].body(), "How are you?");
    }

    #[test]
    fn continuation_lines_join_with_space() {
        let turns = parse_turns("Speaker 1: First line\n   second line  \n\nthird\nSpeaker 2: ok");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "Speaker 1: First line second line third");
    }

    #[test]
    fn lines_before_first_label_are_discarded() {
        let turns = parse_turns("Intro music\nTitle card\nSpeaker 2: Let's start.");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, "Speaker 2: Let's start.");
    }

    #[test]
    fn labels_are_canonicalised() {
        let turns = parse_turns("  SPEAKER   1 : a\nspeaker2：b\nSpeaker 03: c");
        let speakers: Vec<&str> = turns.iter().map(|t| t.speaker.as_str()).collect();
        assert_eq!(speakers, vec!["Speaker 1", "Speaker 2", "Speaker 03"]);
        assert_eq!(turns[1].text, "Speaker 2: b");
    }

    #[test]
    fn label_with_empty_first_line_takes_continuation() {
        let turns = parse_turns("Speaker 1:\nHello");
        assert_eq!(turns[0].text, "Speaker 1: Hello");
    }

    #[test]
    fn no_labels_yields_empty() {
        assert!(parse_turns("Just a monologue.\nWith two lines.").is_empty());
        assert!(parse_turns("").is_empty());
    }

    #[test]
    fn other_label_words_do_not_start_turns() {
        let turns = parse_turns("Speaker 1: hi\nHost: not a turn");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, "Speaker 1: hi Host: not a turn");
    }

    #[test]
    fn reparsing_reconstructed_text_is_idempotent() {
        let script = "preamble\nspeaker 1: Hello\nthere\nSpeaker  2：  Hi!\n\nSPEAKER 1: Bye.";
        let first = parse_turns(script);
        let rebuilt = first
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let second = parse_turns(&rebuilt);
        assert_eq!(first, second);
    }

    #[test]
    fn normalize_dialogue_replaces_exotic_spaces() {
        let raw = "\u{FEFF}Speaker 1:\u{00A0}\u{00A0}Hi\u{202F}there\t\tfriend ";
        assert_eq!(normalize_dialogue(raw), "Speaker 1: Hi there friend");
    }
}
