//! Flanger effect - sweeping comb filter for jet-plane swoosh
//!
//! Mixes the signal with a copy read from a tap that sits `delay` behind the
//! current frame and wobbles by up to `depth` under a sine LFO. There is no
//! feedback path: every output frame depends only on input frames.

use super::{check_finite, check_non_negative, secs_to_frames, Effect, EffectError};
use crate::waveform::Waveform;
use std::f64::consts::PI;
use tracing::debug;

/// Feed-forward flanger with a sine-modulated tap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flanger {
    /// Base delay of the tap in seconds
    pub delay_secs: f32,
    /// LFO excursion of the tap in seconds
    pub depth_secs: f32,
    /// LFO rate in Hz
    pub rate_hz: f32,
}

impl Flanger {
    pub const DEFAULT_DELAY_SECS: f32 = 0.003;
    pub const DEFAULT_DEPTH_SECS: f32 = 0.002;
    pub const DEFAULT_RATE_HZ: f32 = 0.2;

    pub fn new(delay_secs: f32, depth_secs: f32, rate_hz: f32) -> Self {
        Self {
            delay_secs,
            depth_secs,
            rate_hz,
        }
    }

    /// Frame index read for output frame `t`, clamped into the buffer
    #[inline]
    fn tap(t: usize, delay_frames: usize, modulator: f64, frames: usize) -> usize {
        let pos = (t as f64 - delay_frames as f64 + modulator).round();
        pos.clamp(0.0, (frames - 1) as f64) as usize
    }
}

impl Default for Flanger {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_DELAY_SECS,
            Self::DEFAULT_DEPTH_SECS,
            Self::DEFAULT_RATE_HZ,
        )
    }
}

impl Effect for Flanger {
    fn apply(&self, input: &Waveform) -> Result<Waveform, EffectError> {
        check_non_negative("delay", self.delay_secs)?;
        check_finite("depth", self.depth_secs)?;
        check_finite("rate", self.rate_hz)?;

        let sample_rate = input.sample_rate();
        let channels = input.channels() as usize;
        let frames = input.frames();
        let delay_frames = secs_to_frames(self.delay_secs, sample_rate) as usize;
        // A negative depth swings the LFO in the opposite direction
        let depth_frames = secs_to_frames(self.depth_secs, sample_rate);
        let lfo_inc = 2.0 * PI * self.rate_hz as f64 / sample_rate as f64;

        debug!(delay_frames, depth_frames, rate = self.rate_hz, frames, "flanger");

        let src = input.samples();
        let mut out = src.to_vec();

        for t in delay_frames..frames {
            let modulator = depth_frames * (lfo_inc * t as f64).sin();
            let tap = Self::tap(t, delay_frames, modulator, frames);

            let dst = &mut out[t * channels..(t + 1) * channels];
            for (sample, delayed) in dst.iter_mut().zip(input.frame(tap)) {
                *sample += delayed;
            }
        }

        Ok(Waveform::new(out, input.channels(), sample_rate)?)
    }

    fn name(&self) -> &'static str {
        "Flanger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, channels: u16, sample_rate: u32) -> Waveform {
        let samples = (0..frames * channels as usize)
            .map(|i| (i as f32 * 0.37).sin())
            .collect();
        Waveform::new(samples, channels, sample_rate).unwrap()
    }

    #[test]
    fn test_zero_delay_zero_depth_doubles() {
        let wf = ramp(64, 2, 1000);
        let out = Flanger::new(0.0, 0.0, 3.0).apply(&wf).unwrap();
        for (o, i) in out.samples().iter().zip(wf.samples()) {
            assert_eq!(*o, i + i);
        }
    }

    #[test]
    fn test_zero_depth_is_fixed_comb() {
        let wf = ramp(100, 1, 1000);
        // 5ms at 1kHz = 5 frames
        let out = Flanger::new(0.005, 0.0, 0.2).apply(&wf).unwrap();
        let src = wf.samples();
        for t in 0..100 {
            let expected = if t >= 5 { src[t] + src[t - 5] } else { src[t] };
            assert_eq!(out.samples()[t], expected);
        }
    }

    #[test]
    fn test_tap_clamped_inside_buffer() {
        // Depth far larger than the buffer pushes taps past both ends
        let wf = ramp(20, 2, 100);
        let out = Flanger::new(0.0, 5.0, 1.0).apply(&wf).unwrap();
        assert_eq!(out.frames(), 20);
        assert!(out.samples().iter().all(|s| s.is_finite()));

        assert_eq!(Flanger::tap(3, 0, -50.0, 20), 0);
        assert_eq!(Flanger::tap(3, 0, 50.0, 20), 19);
        assert_eq!(Flanger::tap(10, 4, 0.4, 20), 6);
    }

    #[test]
    fn test_delay_longer_than_buffer_is_identity() {
        let wf = ramp(10, 2, 100);
        let out = Flanger::new(1.0, 0.002, 0.2).apply(&wf).unwrap();
        assert_eq!(out, wf);
    }

    #[test]
    fn test_preserves_shape() {
        let wf = ramp(4410, 2, 44100);
        let out = Flanger::default().apply(&wf).unwrap();
        assert_eq!(out.frames(), wf.frames());
        assert_eq!(out.channels(), 2);
        assert_eq!(out.sample_rate(), 44100);
    }

    #[test]
    fn test_negative_depth_inverts_lfo() {
        let wf = ramp(2000, 2, 1000);
        let inverted_depth = Flanger::new(0.005, -0.02, 3.0).apply(&wf).unwrap();
        let inverted_rate = Flanger::new(0.005, 0.02, -3.0).apply(&wf).unwrap();
        let forward = Flanger::new(0.005, 0.02, 3.0).apply(&wf).unwrap();

        assert_eq!(inverted_depth.frames(), wf.frames());
        assert_eq!(inverted_depth, inverted_rate);
        assert_ne!(inverted_depth, forward);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let wf = ramp(10, 1, 100);
        assert!(matches!(
            Flanger::new(-0.003, 0.002, 0.2).apply(&wf),
            Err(EffectError::InvalidParameter { name: "delay", .. })
        ));
        assert!(matches!(
            Flanger::new(0.003, f32::NAN, 0.2).apply(&wf),
            Err(EffectError::InvalidParameter { name: "depth", .. })
        ));
        assert!(matches!(
            Flanger::new(0.003, 0.002, f32::INFINITY).apply(&wf),
            Err(EffectError::InvalidParameter { name: "rate", .. })
        ));
    }
}
