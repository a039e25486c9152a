//! Two-speaker dialogue handling: turn parsing and turn-preserving chunking.

pub mod chunker;
pub mod turns;

pub use chunker::{chunk_turns, OversizedTurn};
pub use turns::{normalize_dialogue, parse_turns, Turn};
