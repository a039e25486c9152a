//! Speech synthesis trait and the Gemini TTS implementation.
//!
//! # Overview
//!
//! [`SpeechSynthesizer`] is the interface the synthesis drivers use.  It is
//! object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn SpeechSynthesizer>`.
//!
//! [`GeminiSpeechClient`] posts to the `generateContent` endpoint with
//! `responseModalities: ["AUDIO"]` and decodes the base64 `inlineData`
//! payload into raw PCM bytes (16-bit little-endian).
//!
//! [`MockSynthesizer`] (available under `#[cfg(test)]`) returns a fixed
//! block of silence and records every request.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::Engine as _;
use thiserror::Error;

use crate::config::{resolve_api_key_with, SynthesisConfig, SYNTHESIS_KEY_VARS};
use crate::error::PodcastError;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

/// All errors that can arise from a synthesis call.
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("synthesis request timed out")]
    Timeout,

    #[error("synthesis endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse synthesis response: {0}")]
    Parse(String),

    /// The response carried no `inlineData.data` payload.
    #[error("synthesis response contained no audio")]
    MissingAudio,

    #[error("audio payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceSelection
// ---------------------------------------------------------------------------

/// Voice attached to a synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelection {
    /// One prebuilt voice for the whole text (monologue).
    Single(String),
    /// Speaker label → prebuilt voice (dialogue).
    MultiSpeaker(BTreeMap<String, String>),
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe `text → PCM bytes` interface.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, text: &str, voice: &VoiceSelection) -> Result<Vec<u8>, TtsError>;
}

// Compile-time assertion: Box<dyn SpeechSynthesizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechSynthesizer>) {}
};

// ---------------------------------------------------------------------------
// GeminiSpeechClient
// ---------------------------------------------------------------------------

/// Blocking Gemini TTS client.
pub struct GeminiSpeechClient {
    client: reqwest::blocking::Client,
    config: SynthesisConfig,
    api_key: String,
}

impl std::fmt::Debug for GeminiSpeechClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSpeechClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl GeminiSpeechClient {
    /// Build a client, resolving the API key from `config.api_key` or the
    /// environment (`GEMINI_API_KEY_TTS`, `GEMINI_API_KEY`, `GEMINI_API_KEY_LLM`).
    pub fn from_config(config: &SynthesisConfig) -> Result<Self, PodcastError> {
        Self::from_config_with(config, |name| std::env::var(name).ok())
    }

    /// [`Self::from_config`] with an injectable environment lookup.
    pub fn from_config_with<F>(config: &SynthesisConfig, lookup: F) -> Result<Self, PodcastError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = resolve_api_key_with(config.api_key.as_deref(), &SYNTHESIS_KEY_VARS, lookup)
            .ok_or(PodcastError::MissingCredential("synthesis"))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }
}

impl SpeechSynthesizer for GeminiSpeechClient {
    fn synthesize(&self, text: &str, voice: &VoiceSelection) -> Result<Vec<u8>, TtsError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let body = request_body(text, voice, self.config.language_code.as_deref());

        log::debug!("synthesis request: {} chars", text.chars().count());
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TtsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| TtsError::Parse(e.to_string()))?;

        decode_pcm(&json)
    }
}

fn request_body(text: &str, voice: &VoiceSelection, language_code: Option<&str>) -> serde_json::Value {
    let mut speech_config = match voice {
        VoiceSelection::Single(name) => serde_json::json!({
            "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": name } }
        }),
        VoiceSelection::MultiSpeaker(voices) => {
            let speakers: Vec<serde_json::Value> = voices
                .iter()
                .map(|(speaker, name)| {
                    serde_json::json!({
                        "speaker": speaker,
                        "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": name } }
                    })
                })
                .collect();
            serde_json::json!({
                "multiSpeakerVoiceConfig": { "speakerVoiceConfigs": speakers }
            })
        }
    };
    if let Some(code) = language_code {
        speech_config["languageCode"] = serde_json::Value::from(code);
    }

    serde_json::json!({
        "contents": [ { "parts": [ { "text": text } ] } ],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": speech_config
        }
    })
}

/// Pull `candidates[0].content.parts[0].inlineData.data` and base64-decode it.
fn decode_pcm(json: &serde_json::Value) -> Result<Vec<u8>, TtsError> {
    let data = json["candidates"][0]["content"]["parts"][0]["inlineData"]["data"]
        .as_str()
        .ok_or(TtsError::MissingAudio)?;
    Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// Returns `samples` zeroed 16-bit samples per call, or fails on the
/// configured call number.
#[cfg(test)]
#[derive(Debug)]
pub struct MockSynthesizer {
    samples: usize,
    fail_on_call: Option<usize>,
    requests: std::sync::Mutex<Vec<(String, VoiceSelection)>>,
}

#[cfg(test)]
impl MockSynthesizer {
    pub fn new(samples: usize) -> Self {
        Self {
            samples,
            fail_on_call: None,
            requests: std::sync::Mutex::default(),
        }
    }

    /// Fail the `n`-th call (1-based) with a 500.
    pub fn failing_on(samples: usize, n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Self::new(samples)
        }
    }

    pub fn requests(&self) -> Vec<(String, VoiceSelection)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[cfg(test)]
impl SpeechSynthesizer for MockSynthesizer {
    fn synthesize(&self, text: &str, voice: &VoiceSelection) -> Result<Vec<u8>, TtsError> {
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((text.to_string(), voice.clone()));
            requests.len()
        };
        if self.fail_on_call == Some(n) {
            return Err(TtsError::Status {
                status: 500,
                body: "mock failure".into(),
            });
        }
        Ok(vec![0u8; self.samples * 2])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
