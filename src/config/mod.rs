//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), a sub-config per collaborator,
//! `AppPaths` for the platform config directory, TOML persistence via
//! `AppConfig::load` / `AppConfig::save_to`, and API-key resolution from the
//! environment.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    default_speaker_voices, resolve_api_key_with, AppConfig, AudioConfig,
    GenerationConfig, PacingConfig, SynthesisConfig, DEFAULT_BASE_URL, GENERATION_KEY_VARS,
    SYNTHESIS_KEY_VARS,
};
