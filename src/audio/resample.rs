//! Channel remixing and sample-rate conversion.
//!
//! Synthesized segments are conformed to one target format before they are
//! concatenated.  This module provides the two conversion steps:
//!
//! 1. [`remix_channels`] — average down to mono, or fan mono out to N channels.
//! 2. [`resample`] — FFT resampling of planar audio with `rubato`.

use rubato::{FftFixedIn, Resampler};

use super::track::AudioError;

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

// ---------------------------------------------------------------------------
// remix_channels
// ---------------------------------------------------------------------------

/// Remix interleaved audio from `from` channels to `to` channels.
///
/// * Same count: returned unchanged.
/// * Anything → 1: every frame is averaged.
/// * 1 → N: the mono sample is duplicated into every channel.
/// * M → N otherwise: downmix to mono, then duplicate.
/// * Either count `0`: empty output.
///
/// # Example
///
/// ```rust
/// use podcast_gen::audio::remix_channels;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = remix_channels(&stereo, 2, 1);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// ```
pub fn remix_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == 0 || to == 0 {
        return Vec::new();
    }
    if from == to {
        return samples.to_vec();
    }

    let mono: Vec<f32> = match from {
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    };

    match to {
        1 => mono,
        n => mono
            .iter()
            .flat_map(|&s| std::iter::repeat(s).take(n as usize))
            .collect(),
    }
}

/// Split interleaved samples into one `Vec` per channel.
pub fn deinterleave(samples: &[f32], channels: u16) -> Vec<Vec<f32>> {
    let n = channels.max(1) as usize;
    let mut planes = vec![Vec::with_capacity(samples.len() / n); n];
    for frame in samples.chunks_exact(n) {
        for (plane, &s) in planes.iter_mut().zip(frame) {
            plane.push(s);
        }
    }
    planes
}

/// Inverse of [`deinterleave`].  Planes are truncated to the shortest.
pub fn interleave(planes: &[Vec<f32>]) -> Vec<f32> {
    let frames = planes.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(frames * planes.len());
    for i in 0..frames {
        out.extend(planes.iter().map(|p| p[i]));
    }
    out
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample planar audio from `from_rate` to `to_rate` Hz.
///
/// The output has `round(frames * to_rate / from_rate)` frames per channel,
/// with the resampler's own delay removed.
pub fn resample(planes: &[Vec<f32>], from_rate: u32, to_rate: u32) -> Result<Vec<Vec<f32>>, AudioError> {
    if from_rate == to_rate || planes.is_empty() {
        return Ok(planes.to_vec());
    }
    let frames = planes[0].len();
    if frames == 0 {
        return Ok(vec![Vec::new(); planes.len()]);
    }

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK,
        SUB_CHUNKS,
        planes.len(),
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let expected = (frames as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let mut out: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay + CHUNK); planes.len()];

    let mut pos = 0;
    while pos + CHUNK <= frames {
        let block: Vec<&[f32]> = planes.iter().map(|p| &p[pos..pos + CHUNK]).collect();
        let processed = resampler
            .process(&block, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        append_planes(&mut out, processed);
        pos += CHUNK;
    }

    if pos < frames {
        let tail: Vec<&[f32]> = planes.iter().map(|p| &p[pos..]).collect();
        let processed = resampler
            .process_partial(Some(tail.as_slice()), None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        append_planes(&mut out, processed);
    }

    // Drain the resampler until the delayed tail has come out.
    while out[0].len() < expected + delay {
        let processed = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        if processed.first().map_or(true, Vec::is_empty) {
            break;
        }
        append_planes(&mut out, processed);
    }

    for plane in &mut out {
        plane.drain(..delay.min(plane.len()));
        plane.resize(expected, 0.0);
    }
    Ok(out)
}

fn append_planes(out: &mut [Vec<f32>], processed: Vec<Vec<f32>>) {
    for (plane, chunk) in out.iter_mut().zip(processed) {
        plane.extend_from_slice(&chunk);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- remix_channels ----------------------------------------------------

    #[test]
    fn remix_same_count_is_noop() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(remix_channels(&input, 1, 1), input);
    }

    #[test]
    fn remix_stereo_to_mono_averages() {
        let input = vec![1.0_f32, -1.0, 0.5, 0.5];
        let out = remix_channels(&input, 2, 1);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn remix_mono_to_stereo_duplicates() {
        let out = remix_channels(&[0.25_f32, -0.75], 1, 2);
        assert_eq!(out, vec![0.25, 0.25, -0.75, -0.75]);
    }

    #[test]
    fn remix_four_to_two() {
        let out = remix_channels(&[0.4_f32; 4], 4, 2);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| (s - 0.4).abs() < 1e-6));
    }

    #[test]
    fn remix_zero_channels() {
        assert!(remix_channels(&[1.0_f32, 2.0], 0, 1).is_empty());
        assert!(remix_channels(&[1.0_f32, 2.0], 1, 0).is_empty());
    }

    #[test]
    fn interleave_inverts_deinterleave() {
        let input = vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let planes = deinterleave(&input, 2);
        assert_eq!(planes, vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]]);
        assert_eq!(interleave(&planes), input);
    }

    // ---- resample ----------------------------------------------------------

    #[test]
    fn resample_same_rate_is_noop() {
        let planes = vec![(0..160).map(|i| i as f32 / 160.0).collect::<Vec<_>>()];
        assert_eq!(resample(&planes, 24_000, 24_000).unwrap(), planes);
    }

    #[test]
    fn resample_empty_input() {
        let out = resample(&[Vec::new()], 48_000, 24_000).unwrap();
        assert_eq!(out, vec![Vec::<f32>::new()]);
    }

    #[test]
    fn resample_48k_to_24k_output_length() {
        // 1 s @ 48 kHz → 1 s @ 24 kHz
        let planes = vec![vec![0.0_f32; 48_000]];
        let out = resample(&planes, 48_000, 24_000).unwrap();
        assert_eq!(out[0].len(), 24_000);
    }

    #[test]
    fn resample_16k_to_24k_stereo_output_length() {
        let planes = vec![vec![0.0_f32; 1_600], vec![0.0_f32; 1_600]];
        let out = resample(&planes, 16_000, 24_000).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 2_400);
        assert_eq!(out[1].len(), 2_400);
    }

    #[test]
    fn resample_constant_signal_keeps_level_in_the_middle() {
        let planes = vec![vec![0.5_f32; 48_000]];
        let out = resample(&planes, 48_000, 24_000).unwrap();
        // edges ring; check the steady-state middle
        let mid = &out[0][4_000..20_000];
        for &s in mid {
            assert!((s - 0.5).abs() < 0.01, "amplitude drift: {s}");
        }
    }
}
