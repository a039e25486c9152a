//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Parse arguments (each podcast knob also reads a `CFG_*` variable).
//! 2. Initialise logging (`RUST_LOG`, default `info`).
//! 3. Load [`AppConfig`] from `--config` or the platform settings file.
//! 4. Build the orchestrator (fails fast if an API key is missing).
//! 5. Read the input document, run, print the audio metadata as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use podcast_gen::{
    config::{AppConfig, AppPaths},
    podcast::{PodcastConfig, PodcastOrchestrator},
    synth::OutputPaths,
};

#[derive(Parser, Debug)]
#[command(name = "podcast-gen", about = "Turn a document into a podcast episode")]
struct Args {
    /// Input document
    #[arg(short, long, default_value = "input.txt")]
    input: PathBuf,

    /// Target length, free text passed to the script prompt
    #[arg(long, env = "CFG_DURATION", default_value = "ngắn (2-3 phút)")]
    duration: String,

    /// Tone, free text passed to the script prompt
    #[arg(long, env = "CFG_STYLE", default_value = "học thuật")]
    style: String,

    /// Number of speakers: 1 (monologue) or 2 (dialogue)
    #[arg(short, long, env = "CFG_CHARACTERS", default_value_t = 1)]
    characters: u8,

    /// WAV output path (default: monologue_audio.wav / dialogue_audio.wav)
    #[arg(long)]
    out_wav: Option<PathBuf>,

    /// MP3 output path (default: monologue_audio.mp3 / dialogue_audio.mp3)
    #[arg(long)]
    out_mp3: Option<PathBuf>,

    /// Alternate settings.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the current settings (defaults if none) to the settings file and exit
    #[arg(long)]
    init_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("podcast-gen starting up");

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };

    if args.init_config {
        let path = args
            .config
            .clone()
            .unwrap_or_else(|| AppPaths::new().settings_file);
        config
            .save_to(&path)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        log::info!("settings written to {}", path.display());
        return Ok(());
    }

    let podcast = PodcastConfig {
        duration: args.duration,
        style: args.style,
        characters: args.characters,
    };
    let speakers = podcast.speakers()?;

    let defaults = OutputPaths::default_for(speakers);
    let outputs = OutputPaths::new(
        args.out_wav.unwrap_or(defaults.wav),
        args.out_mp3.unwrap_or(defaults.mp3),
    );

    let mut orchestrator = PodcastOrchestrator::from_config(&config)?;

    let document = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let result = orchestrator.run(&document, &podcast, &outputs)?;
    log::info!("mode: {:?}", result.mode);

    println!("{}", serde_json::to_string_pretty(&result.audio)?);
    Ok(())
}
