//! Script generation.
//!
//! This module provides:
//! * [`TextGenerator`] — blocking `prompt → text` trait for the generation backend.
//! * [`GeminiTextClient`] — Gemini `generateContent` REST implementation.
//! * [`PromptBuilder`] — builds short and long-with-context prompts.
//! * [`ScriptGenerator`] — single-call or chunked generation with context carry.
//! * [`LlmError`] — error variants for generation calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use podcast_gen::config::AppConfig;
//! use podcast_gen::llm::{GeminiTextClient, PromptBuilder, ScriptGenerator};
//!
//! let config = AppConfig::default();
//! let client = GeminiTextClient::from_config(&config.generation).unwrap();
//! let generator = ScriptGenerator::new(
//!     Arc::new(client),
//!     PromptBuilder::new(&config.generation.language),
//!     config.generation.max_tokens_per_chunk,
//! );
//!
//! let script = generator
//!     .generate("Rivers carve valleys over millennia.", "short", "casual", 1)
//!     .unwrap();
//! println!("{script}");
//! ```

pub mod client;
pub mod generator;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{GeminiTextClient, LlmError, TextGenerator};
pub use generator::ScriptGenerator;
pub use prompt::PromptBuilder;

#[cfg(test)]
pub use client::MockGenerator;
