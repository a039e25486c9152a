//! Orchestrator: document → script → audio.
//!
//! [`PodcastOrchestrator::run`] validates the speaker count, generates the
//! script, and dispatches on [`Speakers`]: one speaker goes to the
//! [`MonologueDriver`], two to the [`DialogueDriver`].  Validation happens
//! before any collaborator is called.

use std::sync::Arc;

use serde::Serialize;

use crate::config::AppConfig;
use crate::error::PodcastError;
use crate::llm::{GeminiTextClient, PromptBuilder, ScriptGenerator, TextGenerator};
use crate::pacing::RateLimiter;
use crate::synth::{AudioOutput, DialogueDriver, MonologueDriver, OutputPaths};
use crate::tts::{GeminiSpeechClient, SpeechSynthesizer};

// ---------------------------------------------------------------------------
// PodcastConfig
// ---------------------------------------------------------------------------

/// The three knobs of a run.  `duration` and `style` are free text passed
/// through to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodcastConfig {
    pub duration: String,
    pub style: String,
    pub characters: u8,
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            duration: "ngắn (2-3 phút)".into(),
            style: "học thuật".into(),
            characters: 1,
        }
    }
}

impl PodcastConfig {
    /// Validated speaker count.
    pub fn speakers(&self) -> Result<Speakers, PodcastError> {
        match self.characters {
            1 => Ok(Speakers::One),
            2 => Ok(Speakers::Two),
            n => Err(PodcastError::InvalidCharacters(n)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speakers {
    One,
    Two,
}

impl Speakers {
    pub fn mode(self) -> PodcastMode {
        match self {
            Speakers::One => PodcastMode::Storytelling,
            Speakers::Two => PodcastMode::Interview,
        }
    }
}

impl OutputPaths {
    /// `monologue_audio.{wav,mp3}` or `dialogue_audio.{wav,mp3}` in the
    /// working directory.
    pub fn default_for(speakers: Speakers) -> Self {
        let stem = match speakers {
            Speakers::One => "monologue_audio",
            Speakers::Two => "dialogue_audio",
        };
        Self::new(format!("{stem}.wav"), format!("{stem}.mp3"))
    }
}

// ---------------------------------------------------------------------------
// PodcastOutput
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PodcastMode {
    Storytelling,
    Interview,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodcastOutput {
    pub mode: PodcastMode,
    /// The generated script.
    pub text: String,
    pub audio: AudioOutput,
}

// ---------------------------------------------------------------------------
// PodcastOrchestrator
// ---------------------------------------------------------------------------

pub struct PodcastOrchestrator {
    script: ScriptGenerator,
    monologue: MonologueDriver,
    dialogue: DialogueDriver,
}

impl PodcastOrchestrator {
    /// Assemble from already-built parts.
    pub fn with_parts(
        script: ScriptGenerator,
        monologue: MonologueDriver,
        dialogue: DialogueDriver,
    ) -> Self {
        Self {
            script,
            monologue,
            dialogue,
        }
    }

    /// Wire the given collaborators with settings from `config`.  Each driver
    /// gets its own rate limiter on the system clock.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        config: &AppConfig,
    ) -> Self {
        let script = ScriptGenerator::new(
            generator,
            PromptBuilder::new(&config.generation.language),
            config.generation.max_tokens_per_chunk,
        );
        let monologue = MonologueDriver::new(
            synthesizer.clone(),
            RateLimiter::from_config(&config.pacing),
            &config.synthesis,
            &config.audio,
        );
        let dialogue = DialogueDriver::new(
            synthesizer,
            RateLimiter::from_config(&config.pacing),
            &config.synthesis,
            &config.audio,
        );
        Self::with_parts(script, monologue, dialogue)
    }

    /// Build the Gemini clients from `config`.  Fails with
    /// `MissingCredential` if either side has no API key.
    pub fn from_config(config: &AppConfig) -> Result<Self, PodcastError> {
        let generator = GeminiTextClient::from_config(&config.generation)?;
        let synthesizer = GeminiSpeechClient::from_config(&config.synthesis)?;
        log::debug!(
            "using {} for text and {} for speech",
            config.generation.model,
            config.synthesis.model
        );
        Ok(Self::new(Arc::new(generator), Arc::new(synthesizer), config))
    }

    /// Generate and synthesize a podcast for `document`.
    pub fn run(
        &mut self,
        document: &str,
        config: &PodcastConfig,
        outputs: &OutputPaths,
    ) -> Result<PodcastOutput, PodcastError> {
        let speakers = config.speakers()?;
        let document = document.trim();
        if document.is_empty() {
            return Err(PodcastError::EmptyInput);
        }

        log::info!(
            "run: {} chars, {:?} mode, duration {:?}, style {:?}",
            document.chars().count(),
            speakers.mode(),
            config.duration,
            config.style
        );
        let started = std::time::Instant::now();

        let text = self
            .script
            .generate(document, &config.duration, &config.style, config.characters)?;

        let audio = match speakers {
            Speakers::One => self.monologue.synthesize(&text, outputs)?,
            Speakers::Two => self.dialogue.synthesize(&text, outputs)?,
        };

        log::info!("run finished in {:.1}s", started.elapsed().as_secs_f64());
        Ok(PodcastOutput {
            mode: speakers.mode(),
            text,
            audio,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
