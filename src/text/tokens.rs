//! Length-based token estimators.
//!
//! Exact counts would need the provider's tokenizer.  The budgets these
//! estimates feed are already safety margins below the provider's hard
//! limits, so a character-length approximation is enough.
//!
//! Two calibrations coexist and are **not** interchangeable:
//!
//! | Estimator                     | Formula              | Used by                       |
//! |-------------------------------|----------------------|-------------------------------|
//! | [`estimate_generation_tokens`] | `chars / 4` (floor)  | script generation budgeting   |
//! | [`estimate_synthesis_tokens`]  | `ceil(chars / 4.2)`  | monologue synthesis chunking  |
//! | [`estimate_turn_tokens`]       | `ceil(chars / 4.2)` after stripping `Speaker N:` labels | dialogue turn packing |
//!
//! Every estimator returns at least `1`.

use std::sync::LazyLock;

use regex::Regex;

/// Characters per token on the synthesis side.
const SYNTHESIS_CHARS_PER_TOKEN: f64 = 4.2;

/// Characters per token on the generation side.
const GENERATION_CHARS_PER_TOKEN: usize = 4;

/// Matches a leading `Speaker N:` label at the start of any line.
static SPEAKER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*Speaker\s*\d+\s*[:：]\s*").expect("speaker label pattern is valid")
});

/// Generation-side estimate: `max(1, chars / 4)`.
///
/// ```rust
/// use podcast_gen::text::estimate_generation_tokens;
///
/// assert_eq!(estimate_generation_tokens(""), 1);
/// assert_eq!(estimate_generation_tokens("abcdefgh"), 2);
/// ```
pub fn estimate_generation_tokens(text: &str) -> usize {
    (text.chars().count() / GENERATION_CHARS_PER_TOKEN).max(1)
}

/// Synthesis-side estimate: `max(1, ceil(chars / 4.2))`.
pub fn estimate_synthesis_tokens(text: &str) -> usize {
    ceil_tokens(text.chars().count())
}

/// Dialogue-turn estimate: strips `Speaker N:` labels, trims, then applies
/// the synthesis calibration.
pub fn estimate_turn_tokens(text: &str) -> usize {
    let stripped = SPEAKER_LABEL.replace_all(text, "");
    ceil_tokens(stripped.trim().chars().count())
}

fn ceil_tokens(chars: usize) -> usize {
    ((chars as f64 / SYNTHESIS_CHARS_PER_TOKEN).ceil() as usize).max(1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_estimate_floors() {
        assert_eq!(estimate_generation_tokens("abc"), 1);
        assert_eq!(estimate_generation_tokens(&"x".repeat(7)), 1);
        assert_eq!(estimate_generation_tokens(&"x".repeat(8)), 2);
        assert_eq!(estimate_generation_tokens(&"x".repeat(200)), 50);
    }

    #[test]
    fn synthesis_estimate_ceils() {
        assert_eq!(estimate_synthesis_tokens("a"), 1);
        assert_eq!(estimate_synthesis_tokens(&"x".repeat(42)), 10);
        assert_eq!(estimate_synthesis_tokens(&"x".repeat(43)), 11);
    }

    #[test]
    fn empty_text_is_at_least_one_token() {
        assert_eq!(estimate_generation_tokens(""), 1);
        assert_eq!(estimate_synthesis_tokens(""), 1);
        assert_eq!(estimate_turn_tokens(""), 1);
    }

    #[test]
    fn estimators_count_chars_not_bytes() {
        // 8 Vietnamese characters, far more than 8 bytes.
        let text = "Xin chào";
        assert_eq!(estimate_generation_tokens(text), 2);
        assert_eq!(estimate_generation_tokens("ấấấấấấấấ"), 2);
    }

    #[test]
    fn turn_estimate_ignores_speaker_label() {
        let body = "x".repeat(42);
        let labelled = format!("Speaker 1: {body}");
        assert_eq!(estimate_turn_tokens(&labelled), 10);
        assert_eq!(estimate_turn_tokens(&body), 10);
    }

    #[test]
    fn turn_estimate_strips_labels_on_every_line() {
        let text = "speaker 1: aaaa\nSPEAKER 2： bbbb";
        // "aaaa\nbbbb" = 9 chars
        assert_eq!(estimate_turn_tokens(text), 3);
    }

    #[test]
    fn calibrations_disagree_on_the_same_text() {
        let text = "x".repeat(400);
        assert_eq!(estimate_generation_tokens(&text), 100);
        assert_eq!(estimate_synthesis_tokens(&text), 96);
    }
}
