//! Document-to-podcast generation.
//!
//! A run turns an input document into a podcast script with a text model,
//! then into speech with a TTS model, as a single-narrator monologue or a
//! two-speaker dialogue.  Every request is kept under the provider's token
//! ceiling by the segmenters in [`text`] and [`dialogue`], and synthesis
//! calls are paced by [`pacing::RateLimiter`].
//!
//! Entry point: [`podcast::PodcastOrchestrator`].

pub mod audio;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod llm;
pub mod pacing;
pub mod podcast;
pub mod synth;
pub mod text;
pub mod tts;

pub use error::PodcastError;
