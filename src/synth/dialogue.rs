//! Two-speaker synthesis.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{AudioOutput, OutputPaths, SegmentRenderer};
use crate::config::{AudioConfig, SynthesisConfig};
use crate::dialogue::{chunk_turns, normalize_dialogue, parse_turns};
use crate::error::PodcastError;
use crate::pacing::RateLimiter;
use crate::tts::{SpeechSynthesizer, VoiceSelection};

/// Parses `Speaker N:` turns, packs whole turns per request, and synthesizes
/// them with a speaker → voice map.
pub struct DialogueDriver {
    renderer: SegmentRenderer,
    voices: BTreeMap<String, String>,
    safe_tokens: usize,
}

impl DialogueDriver {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        limiter: RateLimiter,
        synthesis: &SynthesisConfig,
        audio: &AudioConfig,
    ) -> Self {
        Self {
            renderer: SegmentRenderer::new(synthesizer, limiter, audio),
            voices: synthesis.speaker_voices.clone(),
            safe_tokens: synthesis.safe_tokens,
        }
    }

    /// Fails with `UnparseableDialogue` when no line carries a speaker label
    /// and with `OversizedTurn` when a single turn exceeds the ceiling; in
    /// both cases before any synthesis call.
    pub fn synthesize(
        &mut self,
        script: &str,
        outputs: &OutputPaths,
    ) -> Result<AudioOutput, PodcastError> {
        let text = normalize_dialogue(script);
        if text.is_empty() {
            return Err(PodcastError::EmptyInput);
        }

        let turns = parse_turns(&text);
        if turns.is_empty() {
            return Err(PodcastError::UnparseableDialogue);
        }

        let chunks = chunk_turns(&turns, self.safe_tokens)?;
        log::info!(
            "dialogue: {} turns in {} chunks at ceiling {}",
            turns.len(),
            chunks.len(),
            self.safe_tokens
        );

        self.renderer.render(
            &chunks,
            &VoiceSelection::MultiSpeaker(self.voices.clone()),
            outputs,
        )?;

        Ok(AudioOutput {
            wav: outputs.wav.clone(),
            mp3: outputs.mp3.clone(),
            chunks: chunks.len(),
            turns: Some(turns.len()),
        })
    }
}
