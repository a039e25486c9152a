//! Top-level error type for a podcast run.

use thiserror::Error;

use crate::audio::AudioError;
use crate::dialogue::OversizedTurn;
use crate::llm::LlmError;
use crate::tts::TtsError;

/// Every way a run can fail.  All of them abort the run; nothing partial is
/// written.
#[derive(Debug, Error)]
pub enum PodcastError {
    /// No API key in the config file or the environment.  The payload names
    /// the side that needed one (`"generation"` or `"synthesis"`).
    #[error("no API key found for {0}; set GEMINI_API_KEY or the api_key setting")]
    MissingCredential(&'static str),

    #[error("input is empty after normalisation")]
    EmptyInput,

    #[error("turn by {speaker} is ~{tokens} tokens, over the {max_tokens}-token ceiling")]
    OversizedTurn {
        speaker: String,
        tokens: usize,
        max_tokens: usize,
    },

    #[error("no `Speaker N:` lines found in the dialogue script")]
    UnparseableDialogue,

    #[error("characters must be 1 or 2, got {0}")]
    InvalidCharacters(u8),

    #[error("script generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] TtsError),

    #[error("audio processing failed: {0}")]
    Audio(#[from] AudioError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<OversizedTurn> for PodcastError {
    fn from(e: OversizedTurn) -> Self {
        PodcastError::OversizedTurn {
            speaker: e.speaker,
            tokens: e.tokens,
            max_tokens: e.max_tokens,
        }
    }
}
