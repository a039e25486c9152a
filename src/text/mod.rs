//! Text budgeting: token estimation and size-bounded segmentation.
//!
//! * [`tokens`] — the generation-side and synthesis-side estimators.
//! * [`segment`] — sentence/clause splitting and the two chunkers.

pub mod segment;
pub mod tokens;

pub use segment::{
    chunk_for_generation, chunk_for_synthesis, normalize_spaces, split_clauses,
    split_paragraphs, split_sentences,
};
pub use tokens::{estimate_generation_tokens, estimate_synthesis_tokens, estimate_turn_tokens};
