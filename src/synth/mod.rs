//! Synthesis drivers: turn a script into one exported audio pair.
//!
//! * [`MonologueDriver`] — sentence-packed chunks, one voice.
//! * [`DialogueDriver`] — turn-packed chunks, a speaker → voice map.
//!
//! Both hand their chunks to a [`SegmentRenderer`], which paces the calls,
//! stages each segment as a WAV in a per-run scratch directory, conforms and
//! concatenates them, and writes the WAV and MP3 outputs.  The scratch
//! directory is removed when the render returns, on success or failure.

pub mod dialogue;
pub mod monologue;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::audio::{write_pcm_wav, AudioFormat, AudioTrack};
use crate::config::AudioConfig;
use crate::error::PodcastError;
use crate::pacing::RateLimiter;
use crate::tts::{SpeechSynthesizer, VoiceSelection};

pub use dialogue::DialogueDriver;
pub use monologue::MonologueDriver;

// ---------------------------------------------------------------------------
// OutputPaths / AudioOutput
// ---------------------------------------------------------------------------

/// Where the two encodings of the final audio are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub wav: PathBuf,
    pub mp3: PathBuf,
}

impl OutputPaths {
    pub fn new(wav: impl Into<PathBuf>, mp3: impl Into<PathBuf>) -> Self {
        Self {
            wav: wav.into(),
            mp3: mp3.into(),
        }
    }
}

/// Result metadata of one synthesis driver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioOutput {
    pub wav: PathBuf,
    pub mp3: PathBuf,
    /// Number of synthesis requests issued.
    pub chunks: usize,
    /// Parsed turn count (dialogue only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turns: Option<usize>,
}

// ---------------------------------------------------------------------------
// SegmentRenderer
// ---------------------------------------------------------------------------

/// Paced synthesis + concatenation + export, shared by both drivers.
pub struct SegmentRenderer {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    limiter: RateLimiter,
    format: AudioFormat,
    mp3_bitrate_kbps: u32,
}

impl SegmentRenderer {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        limiter: RateLimiter,
        audio: &AudioConfig,
    ) -> Self {
        Self {
            synthesizer,
            limiter,
            format: AudioFormat::from(audio),
            mp3_bitrate_kbps: audio.mp3_bitrate_kbps,
        }
    }

    /// Synthesize `chunks` in order and export the concatenation to
    /// `outputs`.  Both encodings are staged in the scratch directory and
    /// copied out only once both exist; on any failure neither output is
    /// left behind.
    pub fn render(
        &mut self,
        chunks: &[String],
        voice: &VoiceSelection,
        outputs: &OutputPaths,
    ) -> Result<(), PodcastError> {
        let scratch = tempfile::Builder::new()
            .prefix("podcast-gen-")
            .tempdir()?;
        let mut podcast = AudioTrack::empty(self.format);

        for (i, chunk) in chunks.iter().enumerate() {
            self.limiter.throttle();
            log::info!(
                "synthesizing chunk {}/{} ({} chars)",
                i + 1,
                chunks.len(),
                chunk.chars().count()
            );

            let pcm = self.synthesizer.synthesize(chunk, voice)?;
            let part = scratch.path().join(format!("part_{i:03}.wav"));
            write_pcm_wav(&part, &pcm, &self.format)?;

            // no-op unless the provider's PCM layout drifts from the configured one
            let segment = AudioTrack::load_wav(&part)?.conform(&self.format)?;
            podcast.append(&segment)?;
        }

        let staged_wav = scratch.path().join("podcast.wav");
        let staged_mp3 = scratch.path().join("podcast.mp3");
        podcast.export_wav(&staged_wav)?;
        podcast.export_mp3(&staged_mp3, self.mp3_bitrate_kbps)?;

        ensure_parent(&outputs.wav)?;
        ensure_parent(&outputs.mp3)?;
        std::fs::copy(&staged_wav, &outputs.wav)?;
        if let Err(e) = std::fs::copy(&staged_mp3, &outputs.mp3) {
            let _ = std::fs::remove_file(&outputs.wav);
            return Err(e.into());
        }

        log::info!(
            "exported {:.1}s of audio to {} and {}",
            podcast.duration_secs(),
            outputs.wav.display(),
            outputs.mp3.display()
        );
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pacing::ManualClock;
    use crate::tts::MockSynthesizer;
    use tempfile::tempdir;

    fn renderer(mock: &Arc<MockSynthesizer>, clock: &ManualClock) -> SegmentRenderer {
        let limiter = RateLimiter::with_clock(
            3,
            Duration::from_secs(60),
            Duration::from_millis(50),
            Box::new(clock.clone()),
        );
        SegmentRenderer::new(mock.clone(), limiter, &AudioConfig::default())
    }

    #[test]
    fn concatenates_segments_in_order() {
        let dir = tempdir().expect("temp dir");
        let outputs = OutputPaths::new(dir.path().join("a.wav"), dir.path().join("a.mp3"));
        let mock = Arc::new(MockSynthesizer::new(2_400));
        let clock = ManualClock::new();
        let chunks = vec!["one".to_string(), "two".to_string()];

        renderer(&mock, &clock)
            .render(&chunks, &VoiceSelection::Single("Zephyr".into()), &outputs)
            .unwrap();

        let texts: Vec<String> = mock.requests().into_iter().map(|(t, _)| t).collect();
        assert_eq!(texts, chunks);
        let track = AudioTrack::load_wav(&outputs.wav).unwrap();
        assert_eq!(track.frames(), 4_800);
        assert!(outputs.mp3.exists());
    }

    #[test]
    fn fourth_chunk_waits_for_the_window() {
        let dir = tempdir().expect("temp dir");
        let outputs = OutputPaths::new(dir.path().join("a.wav"), dir.path().join("a.mp3"));
        let mock = Arc::new(MockSynthesizer::new(240));
        let clock = ManualClock::new();
        let chunks: Vec<String> = (0..4).map(|i| format!("chunk {i}")).collect();

        renderer(&mock, &clock)
            .render(&chunks, &VoiceSelection::Single("Zephyr".into()), &outputs)
            .unwrap();

        assert_eq!(mock.calls(), 4);
        assert!(clock.get() >= Duration::from_millis(60_050));
    }

    #[test]
    fn failure_leaves_no_outputs() {
        let dir = tempdir().expect("temp dir");
        let outputs = OutputPaths::new(dir.path().join("a.wav"), dir.path().join("a.mp3"));
        let mock = Arc::new(MockSynthesizer::failing_on(240, 2));
        let clock = ManualClock::new();
        let chunks = vec!["one".to_string(), "two".to_string(), "three".to_string()];

        let err = renderer(&mock, &clock)
            .render(&chunks, &VoiceSelection::Single("Zephyr".into()), &outputs)
            .unwrap_err();

        assert!(matches!(err, PodcastError::Synthesis(_)));
        assert_eq!(mock.calls(), 2);
        assert!(!outputs.wav.exists());
        assert!(!outputs.mp3.exists());
    }

    #[test]
    fn mp3_placement_failure_removes_wav() {
        let dir = tempdir().expect("temp dir");
        let mp3 = dir.path().join("taken.mp3");
        std::fs::create_dir(&mp3).expect("occupy mp3 path");
        let outputs = OutputPaths::new(dir.path().join("a.wav"), mp3);
        let mock = Arc::new(MockSynthesizer::new(240));

        let err = renderer(&mock, &ManualClock::new())
            .render(&["x".to_string()], &VoiceSelection::Single("Zephyr".into()), &outputs)
            .unwrap_err();

        assert!(matches!(err, PodcastError::Io(_)));
        assert!(!outputs.wav.exists());
    }

    #[test]
    fn creates_missing_output_directories() {
        let dir = tempdir().expect("temp dir");
        let outputs = OutputPaths::new(
            dir.path().join("out").join("a.wav"),
            dir.path().join("out").join("a.mp3"),
        );
        let mock = Arc::new(MockSynthesizer::new(240));

        renderer(&mock, &ManualClock::new())
            .render(&["x".to_string()], &VoiceSelection::Single("Zephyr".into()), &outputs)
            .unwrap();

        assert!(outputs.wav.exists());
    }

    #[test]
    fn audio_output_omits_absent_turns() {
        let out = AudioOutput {
            wav: "a.wav".into(),
            mp3: "a.mp3".into(),
            chunks: 1,
            turns: None,
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["chunks"], 1);
        assert!(json.get("turns").is_none());
    }
}
