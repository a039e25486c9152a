//! Single-narrator synthesis.

use std::sync::Arc;

use super::{AudioOutput, OutputPaths, SegmentRenderer};
use crate::config::{AudioConfig, SynthesisConfig};
use crate::error::PodcastError;
use crate::pacing::RateLimiter;
use crate::text::{chunk_for_synthesis, normalize_spaces};
use crate::tts::{SpeechSynthesizer, VoiceSelection};

/// Segments a prose script by sentence and synthesizes it with one voice.
pub struct MonologueDriver {
    renderer: SegmentRenderer,
    voice: String,
    safe_tokens: usize,
}

impl MonologueDriver {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        limiter: RateLimiter,
        synthesis: &SynthesisConfig,
        audio: &AudioConfig,
    ) -> Self {
        Self {
            renderer: SegmentRenderer::new(synthesizer, limiter, audio),
            voice: synthesis.voice.clone(),
            safe_tokens: synthesis.safe_tokens,
        }
    }

    pub fn synthesize(
        &mut self,
        script: &str,
        outputs: &OutputPaths,
    ) -> Result<AudioOutput, PodcastError> {
        let text = normalize_spaces(script);
        if text.is_empty() {
            return Err(PodcastError::EmptyInput);
        }

        let chunks = chunk_for_synthesis(&text, self.safe_tokens);
        if chunks.is_empty() {
            return Err(PodcastError::EmptyInput);
        }
        log::info!(
            "monologue: {} chunks at ceiling {} (voice {})",
            chunks.len(),
            self.safe_tokens,
            self.voice
        );

        self.renderer
            .render(&chunks, &VoiceSelection::Single(self.voice.clone()), outputs)?;

        Ok(AudioOutput {
            wav: outputs.wav.clone(),
            mp3: outputs.mp3.clone(),
            chunks: chunks.len(),
            turns: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pacing::ManualClock;
    use crate::tts::MockSynthesizer;
    use tempfile::tempdir;

    fn driver(mock: &Arc<MockSynthesizer>, safe_tokens: usize) -> MonologueDriver {
        let synthesis = SynthesisConfig {
            safe_tokens,
            ..SynthesisConfig::default()
        };
        let limiter = RateLimiter::with_clock(
            3,
            Duration::from_secs(60),
            Duration::from_millis(50),
            Box::new(ManualClock::new()),
        );
        MonologueDriver::new(mock.clone(), limiter, &synthesis, &AudioConfig::default())
    }

    #[test]
    fn short_script_is_one_chunk() {
        let dir = tempdir().expect("temp dir");
        let outputs = OutputPaths::new(dir.path().join("m.wav"), dir.path().join("m.mp3"));
        let mock = Arc::new(MockSynthesizer::new(240));

        let out = driver(&mock, 2400)
            .synthesize("Rivers carve valleys.  Slowly, over time.", &outputs)
            .unwrap();

        assert_eq!(out.chunks, 1);
        assert_eq!(out.turns, None);
        assert_eq!(out.wav, outputs.wav);
        let (text, voice) = &mock.requests()[0];
        assert_eq!(text, "Rivers carve valleys. Slowly, over time.");
        assert_eq!(voice, &VoiceSelection::Single("Zephyr".into()));
    }

    #[test]
    fn long_script_issues_one_call_per_chunk() {
        let dir = tempdir().expect("temp dir");
        let outputs = OutputPaths::new(dir.path().join("m.wav"), dir.path().join("m.mp3"));
        let mock = Arc::new(MockSynthesizer::new(240));
        // 21 chars → 5 tokens each; ceiling 5 holds one sentence per chunk
        let script = "Aaaaaaaaaaaaaaaaaaaa. Bbbbbbbbbbbbbbbbbbbb. Cccccccccccccccccccc.";

        let out = driver(&mock, 5).synthesize(script, &outputs).unwrap();

        assert_eq!(out.chunks, 3);
        assert_eq!(mock.calls(), 3);
    }

    #[test]
    fn blank_script_is_empty_input() {
        let dir = tempdir().expect("temp dir");
        let outputs = OutputPaths::new(dir.path().join("m.wav"), dir.path().join("m.mp3"));
        let mock = Arc::new(MockSynthesizer::new(240));

        let err = driver(&mock, 2400).synthesize(" \t\n ", &outputs).unwrap_err();

        assert!(matches!(err, PodcastError::EmptyInput));
        assert_eq!(mock.calls(), 0);
    }
}
