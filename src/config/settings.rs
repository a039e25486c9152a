//! Application settings structs, defaults and TOML persistence.
//!
//! Every struct is `Serialize + Deserialize + Default + Clone`, and carries
//! `#[serde(default)]` so a partial `settings.toml` fills the gaps from the
//! defaults below.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Default Gemini REST endpoint shared by text and speech calls.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted for the generation key, in order.
pub const GENERATION_KEY_VARS: [&str; 3] =
    ["GEMINI_API_KEY_LLM", "GEMINI_API_KEY", "GEMINI_API_KEY_TTS"];

/// Environment variables consulted for the synthesis key, in order.
pub const SYNTHESIS_KEY_VARS: [&str; 3] =
    ["GEMINI_API_KEY_TTS", "GEMINI_API_KEY", "GEMINI_API_KEY_LLM"];

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Settings for the script-generation (text) call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the API endpoint.
    pub base_url: String,
    /// API key.  `None` means "look in the environment".
    pub api_key: Option<String>,
    /// Model identifier (e.g. `"gemini-2.0-flash"`).
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output cap per generation call.
    pub max_output_tokens: u32,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Generation-side ceiling per document chunk.
    pub max_tokens_per_chunk: usize,
    /// Prompt language: `"vi"` or `"en"` (anything else falls back to English).
    pub language: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            model: "gemini-2.0-flash".into(),
            temperature: 0.7,
            max_output_tokens: 2048,
            timeout_secs: 120,
            max_tokens_per_chunk: 2600,
            language: "vi".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SynthesisConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-synthesis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// TTS model identifier.
    pub model: String,
    /// Prebuilt voice for monologues.
    pub voice: String,
    /// Optional BCP-47 language code passed to the provider.
    pub language_code: Option<String>,
    /// Synthesis-side ceiling per request.
    pub safe_tokens: usize,
    pub timeout_secs: u64,
    /// Speaker label → prebuilt voice, for dialogues.
    pub speaker_voices: BTreeMap<String, String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            model: "gemini-2.5-flash-preview-tts".into(),
            voice: "Zephyr".into(),
            language_code: None,
            safe_tokens: 2400,
            timeout_secs: 120,
            speaker_voices: default_speaker_voices(),
        }
    }
}

/// `{"Speaker 1": "Zephyr", "Speaker 2": "Puck"}`.
pub fn default_speaker_voices() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Speaker 1".to_string(), "Zephyr".to_string()),
        ("Speaker 2".to_string(), "Puck".to_string()),
    ])
}

// ---------------------------------------------------------------------------
// PacingConfig
// ---------------------------------------------------------------------------

/// Synthesis request budget (free-tier defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Requests allowed per window.
    pub max_requests: usize,
    /// Rolling window length.
    pub window_secs: u64,
    /// Extra wait added after the oldest request leaves the window.
    pub safety_margin_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window_secs: 60,
            safety_margin_ms: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Raw PCM format returned by the provider and used for the exported files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Bytes per sample (only 2 is supported).
    pub sample_width: u16,
    /// Constant bitrate for the MP3 export.
    pub mp3_bitrate_kbps: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
            sample_width: 2,
            mp3_bitrate_kbps: 128,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub synthesis: SynthesisConfig,
    pub pacing: PacingConfig,
    pub audio: AudioConfig,
}

impl AppConfig {
    /// Load from the platform `settings.toml`; defaults when it is missing.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Credential resolution
// ---------------------------------------------------------------------------

/// Pick an API key: `explicit` if non-empty, else the first non-empty
/// value `lookup` returns for `vars`, in order.
pub fn resolve_api_key_with<F>(explicit: Option<&str>, vars: &[&str], lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .filter(|key| !key.trim().is_empty())
        .map(str::to_string)
        .or_else(|| {
            vars.iter()
                .filter_map(|name| lookup(*name))
                .find(|key| !key.trim().is_empty())
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
