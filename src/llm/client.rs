//! `TextGenerator` trait and the Gemini `generateContent` implementation.
//!
//! The script generator only needs `prompt → text`.  Errors are opaque to
//! it: any failure propagates and aborts the run, with no retry here.

use std::time::Duration;

use thiserror::Error;

use crate::config::{resolve_api_key_with, GenerationConfig, GENERATION_KEY_VARS};
use crate::error::PodcastError;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors from the generation collaborator.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("generation request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("generation endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse generation response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Black-box text generation: `prompt → text`.
///
/// Implementors must be `Send + Sync` so they can sit behind an
/// `Arc<dyn TextGenerator>`.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// GeminiTextClient
// ---------------------------------------------------------------------------

/// Calls `POST {base_url}/v1beta/models/{model}:generateContent`.
pub struct GeminiTextClient {
    client: reqwest::blocking::Client,
    config: GenerationConfig,
    api_key: String,
}

impl std::fmt::Debug for GeminiTextClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiTextClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl GeminiTextClient {
    /// Build a client, resolving the API key from `config.api_key` or the
    /// environment (`GEMINI_API_KEY_LLM`, `GEMINI_API_KEY`,
    /// `GEMINI_API_KEY_TTS`).
    pub fn from_config(config: &GenerationConfig) -> Result<Self, PodcastError> {
        Self::from_config_with(config, |name| std::env::var(name).ok())
    }

    /// [`Self::from_config`] with an injectable environment lookup.
    pub fn from_config_with<F>(config: &GenerationConfig, lookup: F) -> Result<Self, PodcastError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = resolve_api_key_with(config.api_key.as_deref(), &GENERATION_KEY_VARS, lookup)
            .ok_or(PodcastError::MissingCredential("generation"))?;

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

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "maxOutputTokens": self.config.max_output_tokens,
                "temperature":     self.config.temperature
            }
        })
    }
}

impl TextGenerator for GeminiTextClient {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let text = extract_text(&json);
        if text.is_empty() {
            log::warn!("generation call returned no text parts");
        }
        Ok(text)
    }
}

/// Join every `candidates[*].content.parts[*].text` with newlines and trim.
fn extract_text(json: &serde_json::Value) -> String {
    let candidates = json["candidates"].as_array().map(Vec::as_slice).unwrap_or_default();
    candidates
        .iter()
        .filter_map(|c| c["content"]["parts"].as_array())
        .flatten()
        .filter_map(|part| part["text"].as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// MockGenerator  (test-only)
// ---------------------------------------------------------------------------

/// Scripted `TextGenerator`: returns queued replies in order, then
/// `"reply <n>"` once the queue is empty.  Records every prompt.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockGenerator {
    replies: std::sync::Mutex<std::collections::VecDeque<Result<String, LlmError>>>,
    prompts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
            prompts: std::sync::Mutex::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[cfg(test)]
impl TextGenerator for MockGenerator {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let n = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("reply {n}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
