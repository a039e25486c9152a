//! Audio container handling for synthesized speech.
//!
//! # Pipeline
//!
//! ```text
//! PCM bytes → write_pcm_wav → AudioTrack::load_wav → conform (remix + rubato)
//!           → append … → export_wav / export_mp3
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use podcast_gen::audio::{AudioFormat, AudioTrack};
//!
//! let format = AudioFormat::default();
//! let mut podcast = AudioTrack::empty(format);
//! for part in ["part_000.wav", "part_001.wav"] {
//!     let segment = AudioTrack::load_wav(Path::new(part)).unwrap().conform(&format).unwrap();
//!     podcast.append(&segment).unwrap();
//! }
//! podcast.export_wav(Path::new("podcast.wav")).unwrap();
//! podcast.export_mp3(Path::new("podcast.mp3"), 128).unwrap();
//! ```

pub mod resample;
pub mod track;

pub use resample::{deinterleave, interleave, remix_channels, resample};
pub use track::{write_pcm_wav, AudioError, AudioFormat, AudioTrack};
