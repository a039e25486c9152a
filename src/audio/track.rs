//! In-memory audio track: WAV load/save, concatenation, format conforming
//! and MP3 export.
//!
//! Samples are stored interleaved as `i16`.  Only 16-bit integer PCM is
//! supported anywhere in this module.

use std::path::Path;

use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};
use thiserror::Error;

use super::resample::{deinterleave, interleave, remix_channels, resample};
use crate::config::AudioConfig;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// Errors from the audio container layer.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("WAV I/O failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Sample width, sample format or channel count this module can't handle.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("cannot append {found:?} audio to a {expected:?} track")]
    FormatMismatch {
        expected: AudioFormat,
        found: AudioFormat,
    },

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("MP3 encoding failed: {0}")]
    Mp3(String),
}

// ---------------------------------------------------------------------------
// AudioFormat
// ---------------------------------------------------------------------------

/// Raw PCM layout.  `sample_width` is in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_width: u16,
}

impl Default for AudioFormat {
    /// 24 kHz, mono, 16-bit: what the speech endpoint returns.
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
            sample_width: 2,
        }
    }
}

impl From<&AudioConfig> for AudioFormat {
    fn from(config: &AudioConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
            sample_width: config.sample_width,
        }
    }
}

impl AudioFormat {
    fn ensure_supported(&self) -> Result<(), AudioError> {
        if self.sample_width != 2 {
            return Err(AudioError::UnsupportedFormat(format!(
                "{}-byte samples (only 16-bit PCM is supported)",
                self.sample_width
            )));
        }
        if self.channels == 0 || self.sample_rate == 0 {
            return Err(AudioError::UnsupportedFormat(format!(
                "{} channels at {} Hz",
                self.channels, self.sample_rate
            )));
        }
        Ok(())
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

// ---------------------------------------------------------------------------
// write_pcm_wav
// ---------------------------------------------------------------------------

/// Wrap raw little-endian PCM bytes in a WAV container at `path`.
///
/// A trailing odd byte (half a sample) is dropped.
pub fn write_pcm_wav(path: &Path, pcm: &[u8], format: &AudioFormat) -> Result<(), AudioError> {
    format.ensure_supported()?;
    if pcm.len() % 2 != 0 {
        log::warn!("PCM payload has an odd byte count ({}); dropping the last byte", pcm.len());
    }

    let mut writer = hound::WavWriter::create(path, format.wav_spec())?;
    for pair in pcm.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([pair[0], pair[1]]))?;
    }
    writer.finalize()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// AudioTrack
// ---------------------------------------------------------------------------

/// A decoded, interleaved 16-bit track.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    format: AudioFormat,
    samples: Vec<i16>,
}

impl AudioTrack {
    /// An empty track in `format`.
    pub fn empty(format: AudioFormat) -> Self {
        Self {
            format,
            samples: Vec::new(),
        }
    }

    pub fn from_samples(format: AudioFormat, samples: Vec<i16>) -> Self {
        Self { format, samples }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.format.sample_rate.max(1) as f64
    }

    /// Read a 16-bit integer WAV file.
    pub fn load_wav(path: &Path) -> Result<Self, AudioError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(AudioError::UnsupportedFormat(format!(
                "{}-bit {:?} WAV",
                spec.bits_per_sample, spec.sample_format
            )));
        }

        let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            format: AudioFormat {
                sample_rate: spec.sample_rate,
                channels: spec.channels,
                sample_width: 2,
            },
            samples,
        })
    }

    /// Concatenate `other` onto the end of this track.  Both must share one
    /// format; call [`AudioTrack::conform`] first.
    pub fn append(&mut self, other: &AudioTrack) -> Result<(), AudioError> {
        if other.format != self.format {
            return Err(AudioError::FormatMismatch {
                expected: self.format,
                found: other.format,
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Convert to `target` channel count and sample rate.
    pub fn conform(self, target: &AudioFormat) -> Result<Self, AudioError> {
        target.ensure_supported()?;
        if self.format == *target {
            return Ok(self);
        }

        let floats: Vec<f32> = self
            .samples
            .iter()
            .map(|&s| s as f32 / i16::MAX as f32)
            .collect();
        let remixed = remix_channels(&floats, self.format.channels, target.channels);
        let planes = deinterleave(&remixed, target.channels);
        let resampled = resample(&planes, self.format.sample_rate, target.sample_rate)?;

        let samples = interleave(&resampled)
            .into_iter()
            .map(|s| (s * i16::MAX as f32).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
            .collect();

        log::debug!(
            "conformed {:?} → {:?}",
            self.format,
            target
        );
        Ok(Self {
            format: *target,
            samples,
        })
    }

    /// Write the track as a 16-bit WAV file.
    pub fn export_wav(&self, path: &Path) -> Result<(), AudioError> {
        let mut writer = hound::WavWriter::create(path, self.format.wav_spec())?;
        for &s in &self.samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Encode the track as constant-bitrate MP3 (mono or stereo only).
    pub fn export_mp3(&self, path: &Path, bitrate_kbps: u32) -> Result<(), AudioError> {
        let mut builder = Builder::new()
            .ok_or_else(|| AudioError::Mp3("failed to allocate LAME encoder".into()))?;
        let channels = match self.format.channels {
            1 => 1u8,
            2 => 2u8,
            n => {
                return Err(AudioError::UnsupportedFormat(format!(
                    "MP3 export of {n} channels"
                )))
            }
        };
        builder.set_num_channels(channels).map_err(mp3_err)?;
        builder.set_sample_rate(self.format.sample_rate).map_err(mp3_err)?;
        builder.set_brate(bitrate(bitrate_kbps)).map_err(mp3_err)?;
        builder.set_quality(Quality::Best).map_err(mp3_err)?;
        let mut encoder = builder.build().map_err(mp3_err)?;

        let frames = self.frames();
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(frames) + 7200);
        if channels == 1 {
            encoder
                .encode_to_vec(MonoPcm(&self.samples), &mut out)
                .map_err(mp3_err)?;
        } else {
            encoder
                .encode_to_vec(InterleavedPcm(&self.samples), &mut out)
                .map_err(mp3_err)?;
        }
        out.reserve(7200);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(mp3_err)?;

        std::fs::write(path, out)?;
        Ok(())
    }
}

fn mp3_err<E: std::fmt::Debug>(e: E) -> AudioError {
    AudioError::Mp3(format!("{e:?}"))
}

/// Nearest supported constant bitrate at or below `kbps` (minimum 8).
fn bitrate(kbps: u32) -> Bitrate {
    match kbps {
        0..=15 => Bitrate::Kbps8,
        16..=23 => Bitrate::Kbps16,
        24..=31 => Bitrate::Kbps24,
        32..=39 => Bitrate::Kbps32,
        40..=47 => Bitrate::Kbps40,
        48..=63 => Bitrate::Kbps48,
        64..=79 => Bitrate::Kbps64,
        80..=95 => Bitrate::Kbps80,
        96..=111 => Bitrate::Kbps96,
        112..=127 => Bitrate::Kbps112,
        128..=159 => Bitrate::Kbps128,
        160..=191 => Bitrate::Kbps160,
        192..=223 => Bitrate::Kbps192,
        224..=255 => Bitrate::Kbps224,
        256..=319 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tone(format: AudioFormat, frames: usize) -> AudioTrack {
        let samples = (0..frames * format.channels as usize)
            .map(|i| ((i % 200) as i16 - 100) * 100)
            .collect();
        AudioTrack::from_samples(format, samples)
    }

    #[test]
    fn pcm_bytes_round_trip_through_wav() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("part_000.wav");
        let pcm: Vec<u8> = [1i16, -2, 300, i16::MIN]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();

        write_pcm_wav(&path, &pcm, &AudioFormat::default()).unwrap();
        let track = AudioTrack::load_wav(&path).unwrap();

        assert_eq!(track.format(), AudioFormat::default());
        assert_eq!(track.samples(), &[1, -2, 300, i16::MIN]);
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("odd.wav");
        write_pcm_wav(&path, &[0x10, 0x00, 0xff], &AudioFormat::default()).unwrap();
        assert_eq!(AudioTrack::load_wav(&path).unwrap().samples(), &[16]);
    }

    #[test]
    fn non_16_bit_width_is_rejected() {
        let dir = tempdir().expect("temp dir");
        let format = AudioFormat {
            sample_width: 3,
            ..AudioFormat::default()
        };
        let err = write_pcm_wav(&dir.path().join("x.wav"), &[0; 6], &format).unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedFormat(_)));

        let err = tone(AudioFormat::default(), 10).conform(&format).unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedFormat(_)));
    }

    #[test]
    fn append_concatenates_in_order() {
        let format = AudioFormat::default();
        let mut track = AudioTrack::from_samples(format, vec![1, 2]);
        track.append(&AudioTrack::from_samples(format, vec![3])).unwrap();
        assert_eq!(track.samples(), &[1, 2, 3]);
    }

    #[test]
    fn append_rejects_mismatched_format() {
        let mut track = AudioTrack::empty(AudioFormat::default());
        let stereo = AudioFormat {
            channels: 2,
            ..AudioFormat::default()
        };
        let err = track.append(&AudioTrack::from_samples(stereo, vec![0, 0])).unwrap_err();
        assert!(matches!(err, AudioError::FormatMismatch { .. }));
    }

    #[test]
    fn conform_stereo_48k_to_mono_24k() {
        let source = AudioFormat {
            sample_rate: 48_000,
            channels: 2,
            sample_width: 2,
        };
        let conformed = tone(source, 4_800).conform(&AudioFormat::default()).unwrap();
        assert_eq!(conformed.format(), AudioFormat::default());
        assert_eq!(conformed.frames(), 2_400);
    }

    #[test]
    fn conform_same_format_is_identity() {
        let track = tone(AudioFormat::default(), 100);
        assert_eq!(track.clone().conform(&AudioFormat::default()).unwrap(), track);
    }

    #[test]
    fn export_wav_and_mp3() {
        let dir = tempdir().expect("temp dir");
        let wav = dir.path().join("out.wav");
        let mp3 = dir.path().join("out.mp3");
        let track = tone(AudioFormat::default(), 24_000);

        track.export_wav(&wav).unwrap();
        track.export_mp3(&mp3, 128).unwrap();

        let reloaded = AudioTrack::load_wav(&wav).unwrap();
        assert!((reloaded.duration_secs() - 1.0).abs() < 1e-9);
        assert!(std::fs::metadata(&mp3).unwrap().len() > 0);
    }

    #[test]
    fn mp3_rejects_surround() {
        let dir = tempdir().expect("temp dir");
        let format = AudioFormat {
            channels: 6,
            ..AudioFormat::default()
        };
        let err = tone(format, 10).export_mp3(&dir.path().join("x.mp3"), 128).unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedFormat(_)));
    }

    #[test]
    fn bitrate_rounds_down() {
        assert!(matches!(bitrate(128), Bitrate::Kbps128));
        assert!(matches!(bitrate(150), Bitrate::Kbps128));
        assert!(matches!(bitrate(1_000), Bitrate::Kbps320));
    }
}
