//! Sentence segmentation and size-bounded chunk packing.
//!
//! Two segmenters live here and they are deliberately different algorithms:
//!
//! * [`chunk_for_synthesis`] — paragraph-aware, splits sentences on terminal
//!   punctuation (`.`, `?`, `!`, `…`) followed by whitespace, and falls back
//!   to clause-level ("soft") splitting on `,` `;` `:` `–` `—` when a single
//!   sentence is over the ceiling.  Budgeted with
//!   [`estimate_synthesis_tokens`].
//! * [`chunk_for_generation`] — splits only on the literal `". "` sequence,
//!   has no soft-split fallback, and is budgeted with
//!   [`estimate_generation_tokens`].
//!
//! Both are pure functions: same input, same chunks.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::tokens::{estimate_generation_tokens, estimate_synthesis_tokens};

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("whitespace pattern is valid"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph pattern is valid"));

/// Terminal punctuation (captured) followed by whitespace.
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.?!…])\s+").expect("sentence pattern is valid"));

/// Clause punctuation (captured) followed by whitespace.
static CLAUSE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([,;:–—])\s+").expect("clause pattern is valid"));

// ---------------------------------------------------------------------------
// GreedyPacker
// ---------------------------------------------------------------------------

/// Greedy first-fit packer shared by the synthesis segmenter and the
/// dialogue turn chunker.
///
/// A buffer's running cost is the sum of its unit estimates plus one token
/// per joining space.  A unit joins the buffer when the new cost is
/// `<= max_tokens`; otherwise the buffer is flushed and the unit starts a
/// fresh one (even if it is larger than the ceiling on its own).
pub(crate) struct GreedyPacker {
    max_tokens: usize,
    buf: Vec<String>,
    tokens: usize,
    chunks: Vec<String>,
}

impl GreedyPacker {
    pub(crate) fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            buf: Vec::new(),
            tokens: 0,
            chunks: Vec::new(),
        }
    }

    /// Add `unit` whose estimate is `unit_tokens`.
    pub(crate) fn push(&mut self, unit: String, unit_tokens: usize) {
        let separator = usize::from(!self.buf.is_empty());
        if self.tokens + unit_tokens + separator <= self.max_tokens {
            self.buf.push(unit);
            self.tokens += unit_tokens + separator;
        } else {
            self.flush();
            self.buf.push(unit);
            self.tokens = unit_tokens;
        }
    }

    /// Emit `unit` as a chunk of its own, closing the current buffer first.
    pub(crate) fn push_alone(&mut self, unit: String) {
        self.flush();
        self.chunks.push(unit);
    }

    fn flush(&mut self) {
        if !self.buf.is_empty() {
            self.chunks.push(self.buf.join(" "));
            self.buf.clear();
        }
        self.tokens = 0;
    }

    pub(crate) fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

// ---------------------------------------------------------------------------
// Splitting helpers
// ---------------------------------------------------------------------------

/// Collapse runs of spaces/tabs to a single space and trim.  Newlines are
/// kept so paragraph boundaries survive.
pub fn normalize_spaces(text: &str) -> String {
    HORIZONTAL_SPACE.replace_all(text.trim(), " ").trim().to_string()
}

/// Split on blank-line boundaries, dropping empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split a paragraph into sentences.  The terminal mark stays with its
/// sentence; the whitespace after it is dropped.
pub fn split_sentences(paragraph: &str) -> Vec<&str> {
    split_after_mark(paragraph, &SENTENCE_BREAK)
}

/// Split an oversized sentence into clauses on `,` `;` `:` and dashes.
pub fn split_clauses(sentence: &str) -> Vec<&str> {
    split_after_mark(sentence, &CLAUSE_BREAK)
}

fn split_after_mark<'a>(text: &'a str, pattern: &Regex) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for caps in pattern.captures_iter(text) {
        let (Some(whole), Some(mark)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        parts.push(&text[start..mark.end()]);
        start = whole.end();
    }
    parts.push(&text[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Synthesis segmenter
// ---------------------------------------------------------------------------

/// Pack `text` into chunks whose [`estimate_synthesis_tokens`] stays within
/// `max_tokens`.
///
/// Sentences are accumulated greedily across paragraph boundaries and joined
/// with a single space.  A sentence that is over the ceiling on its own is
/// soft-split into clauses, which are packed into sub-buffers by the same
/// rule and then folded into the running chunk.  A sentence with no clause
/// delimiters is emitted verbatim as an oversized chunk; the provider may
/// reject it.  Likewise a single clause that is still over the ceiling after
/// the soft split goes out as its own oversized chunk.  Both cases are
/// logged at `warn`.
///
/// ```rust
/// use podcast_gen::text::chunk_for_synthesis;
///
/// let chunks = chunk_for_synthesis("One.  Two?\n\nThree!", 2400);
/// assert_eq!(chunks, vec!["One. Two? Three!".to_string()]);
/// ```
pub fn chunk_for_synthesis(text: &str, max_tokens: usize) -> Vec<String> {
    let text = normalize_spaces(text);
    let mut packer = GreedyPacker::new(max_tokens);

    for paragraph in split_paragraphs(&text) {
        for sentence in split_sentences(paragraph) {
            let tokens = estimate_synthesis_tokens(sentence);
            if tokens <= max_tokens {
                packer.push(sentence.to_string(), tokens);
                continue;
            }

            let clauses = split_clauses(sentence);
            if clauses.len() == 1 {
                log::warn!(
                    "sentence of ~{tokens} tokens has no clause delimiters; \
                     sending it over the {max_tokens}-token ceiling"
                );
                packer.push_alone(sentence.to_string());
                continue;
            }

            let mut clause_packer = GreedyPacker::new(max_tokens);
            for clause in clauses {
                clause_packer.push(clause.to_string(), estimate_synthesis_tokens(clause));
            }
            for sub in clause_packer.finish() {
                let sub_tokens = estimate_synthesis_tokens(&sub);
                if sub_tokens > max_tokens {
                    log::warn!(
                        "clause of ~{sub_tokens} tokens cannot be split further; \
                         sending it over the {max_tokens}-token ceiling"
                    );
                }
                packer.push(sub, sub_tokens);
            }
        }
    }

    packer.finish()
}

// ---------------------------------------------------------------------------
// Generation segmenter
// ---------------------------------------------------------------------------

/// Split `text` on the literal `". "` and pack the pieces into chunks for the
/// script generator.
///
/// A chunk closes when adding the next piece would push its summed
/// [`estimate_generation_tokens`] above `max_tokens` (hitting it exactly is
/// allowed).  Pieces are re-joined with `". "` and the chunk is closed with
/// a period unless it already ends with one.  There is no soft-split
/// fallback: a single huge piece becomes a single huge chunk.
pub fn chunk_for_generation(text: &str, max_tokens: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_tokens = 0;

    for sentence in text.split(". ").map(str::trim).filter(|s| !s.is_empty()) {
        let tokens = estimate_generation_tokens(sentence);
        if current_tokens + tokens > max_tokens && !current.is_empty() {
            chunks.push(close_literal(&current));
            current.clear();
            current_tokens = 0;
        }
        current.push(sentence);
        current_tokens += tokens;
    }

    if !current.is_empty() {
        chunks.push(close_literal(&current));
    }

    chunks
}

fn close_literal(sentences: &[&str]) -> String {
    let mut chunk = sentences.join(". ");
    if !chunk.ends_with('.') {
        chunk.push('.');
    }
    chunk
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
