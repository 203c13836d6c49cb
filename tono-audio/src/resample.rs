//! Buffer primitives shared by the effects: fractional-index reads,
//! peak normalization, and sample-rate conversion.

use crate::waveform::{Waveform, WaveformError};
use rubato::{FftFixedInOut, Resampler};
use thiserror::Error;

/// Errors from sample-rate conversion
#[derive(Error, Debug)]
pub enum ResampleError {
    #[error("Resampler error: {0}")]
    Resampler(String),
    #[error(transparent)]
    Waveform(#[from] WaveformError),
}

/// Read `samples` at fractional `positions` with linear interpolation
///
/// Positions left of the first sample take the first sample; positions right
/// of the last sample take the last sample.
pub fn interpolate(samples: &[f32], positions: &[f64]) -> Vec<f32> {
    if samples.is_empty() {
        return vec![0.0; positions.len()];
    }

    let last = samples.len() - 1;
    positions
        .iter()
        .map(|&pos| {
            if pos.is_nan() || pos <= 0.0 {
                return samples[0];
            }
            if pos >= last as f64 {
                return samples[last];
            }

            let i0 = pos as usize;
            let frac = pos - i0 as f64;
            let a = samples[i0] as f64;
            let b = samples[i0 + 1] as f64;
            (a + (b - a) * frac) as f32
        })
        .collect()
}

/// Scale `samples` so the largest magnitude becomes exactly 1.0
///
/// Returns `false` and leaves the slice untouched if it is silent.
pub fn normalize_peak(samples: &mut [f32]) -> bool {
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    if peak == 0.0 || !peak.is_finite() {
        return false;
    }

    for s in samples.iter_mut() {
        *s /= peak;
    }
    true
}

/// Convert a waveform to `target_rate`
pub fn resample(waveform: &Waveform, target_rate: u32) -> Result<Waveform, ResampleError> {
    let source_rate = waveform.sample_rate();
    if source_rate == target_rate {
        return Ok(waveform.clone());
    }
    if waveform.is_empty() {
        return Ok(Waveform::new(Vec::new(), waveform.channels(), target_rate)?);
    }

    let channels = waveform.channels() as usize;
    let frames = waveform.frames();
    let expected = (frames as u64 * target_rate as u64 / source_rate as u64) as usize;

    let mut resampler =
        FftFixedInOut::<f32>::new(source_rate as usize, target_rate as usize, 1024, channels)
            .map_err(|e| ResampleError::Resampler(e.to_string()))?;
    let block_len = resampler.input_frames_next();

    let planar: Vec<Vec<f32>> = (0..channels).map(|ch| waveform.channel(ch)).collect();
    let mut block = vec![vec![0.0f32; block_len]; channels];
    let mut converted: Vec<Vec<f32>> =
        vec![Vec::with_capacity(expected + resampler.output_frames_max()); channels];

    // The last block is zero-padded; its surplus output is cut below
    for start in (0..frames).step_by(block_len) {
        let end = (start + block_len).min(frames);
        for (dst, src) in block.iter_mut().zip(&planar) {
            dst.fill(0.0);
            dst[..end - start].copy_from_slice(&src[start..end]);
        }

        let out = resampler
            .process(&block, None)
            .map_err(|e| ResampleError::Resampler(e.to_string()))?;
        for (dst, data) in converted.iter_mut().zip(out) {
            dst.extend(data);
        }
    }

    for channel in &mut converted {
        channel.truncate(expected);
    }

    Ok(Waveform::from_channels(converted, target_rate)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_between_samples() {
        let samples = [0.0, 1.0, 0.0];
        let out = interpolate(&samples, &[0.0, 0.5, 1.0, 1.25, 2.0]);
        assert_eq!(out, vec![0.0, 0.5, 1.0, 0.75, 0.0]);
    }

    #[test]
    fn test_interpolate_clamps_at_edges() {
        let samples = [0.25, 0.5, 0.75];
        let out = interpolate(&samples, &[-3.0, -0.1, 2.5, 100.0]);
        assert_eq!(out, vec![0.25, 0.25, 0.75, 0.75]);
    }

    #[test]
    fn test_interpolate_empty_source() {
        assert_eq!(interpolate(&[], &[0.0, 1.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_normalize_peak() {
        let mut samples = vec![0.25, -0.5, 0.1];
        assert!(normalize_peak(&mut samples));
        assert_eq!(samples[1], -1.0);
        assert_eq!(samples[0], 0.5);
    }

    #[test]
    fn test_normalize_silent_is_noop() {
        let mut samples = vec![0.0; 8];
        assert!(!normalize_peak(&mut samples));
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_resample_length_scales_with_rate() {
        let samples: Vec<f32> = (0..48000)
            .flat_map(|i| {
                let s = (i as f32 * 0.01).sin() * 0.5;
                [s, s]
            })
            .collect();
        let wf = Waveform::new(samples, 2, 48000).unwrap();

        let out = resample(&wf, 24000).unwrap();
        assert_eq!(out.sample_rate(), 24000);
        assert_eq!(out.channels(), 2);
        assert_eq!(out.frames(), 24000);
        assert!(out.samples().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_resample_short_tail() {
        // Fewer frames than one resampler block
        let wf = Waveform::new(vec![0.25; 2 * 300], 2, 44100).unwrap();
        let out = resample(&wf, 48000).unwrap();
        assert_eq!(out.frames(), 300 * 48000 / 44100);
        assert_eq!(out.channels(), 2);
    }

    #[test]
    fn test_resample_same_rate_is_copy() {
        let wf = Waveform::new(vec![0.1, 0.2, 0.3], 1, 44100).unwrap();
        let out = resample(&wf, 44100).unwrap();
        assert_eq!(out, wf);
    }
}
