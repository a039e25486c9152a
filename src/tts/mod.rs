//! Speech synthesis collaborator.

pub mod client;

pub use client::{GeminiSpeechClient, SpeechSynthesizer, TtsError, VoiceSelection};

#[cfg(test)]
pub use client::MockSynthesizer;
