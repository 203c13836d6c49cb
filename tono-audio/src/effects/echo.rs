//! Echo effect - recursive feedback delay line
//!
//! Each output frame adds `decay` times the output from `delay` seconds
//! earlier, so repeats fall off as `decay^k`. Output is not normalized.

use super::{check_finite, check_non_negative, secs_to_frames, Effect, EffectError};
use crate::waveform::Waveform;
use tracing::debug;

/// Feedback echo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Echo {
    /// Delay between repeats in seconds
    pub delay_secs: f32,
    /// Feedback gain applied to each repeat
    pub decay: f32,
}

impl Echo {
    pub const DEFAULT_DELAY_SECS: f32 = 0.7;
    pub const DEFAULT_DECAY: f32 = 0.5;

    pub fn new(delay_secs: f32, decay: f32) -> Self {
        Self { delay_secs, decay }
    }
}

impl Default for Echo {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY_SECS, Self::DEFAULT_DECAY)
    }
}

impl Effect for Echo {
    fn apply(&self, input: &Waveform) -> Result<Waveform, EffectError> {
        check_non_negative("delay", self.delay_secs)?;
        check_finite("decay", self.decay)?;

        let channels = input.channels() as usize;
        let delay_frames = secs_to_frames(self.delay_secs, input.sample_rate()) as usize;
        let lag = delay_frames * channels;
        let src = input.samples();

        debug!(delay_frames, decay = self.decay, frames = input.frames(), "echo");

        // Strictly forward: each sample feeds back from already-written output.
        // With zero lag the feedback tap is the slot about to be written (still 0).
        let mut out = vec![0.0f32; src.len()];
        for i in 0..src.len() {
            let feedback = if i >= lag { out[i - lag] } else { 0.0 };
            out[i] = src[i] + self.decay * feedback;
        }

        Ok(Waveform::new(out, input.channels(), input.sample_rate())?)
    }

    fn name(&self) -> &'static str {
        "Echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_decays_geometrically() {
        let wf = Waveform::new(vec![1.0, 0.0, 0.0, 0.0], 1, 4).unwrap();
        let out = Echo::new(0.25, 0.5).apply(&wf).unwrap();
        assert_eq!(out.samples(), &[1.0, 0.5, 0.25, 0.125]);
    }

    #[test]
    fn test_zero_decay_is_identity() {
        let samples: Vec<f32> = (0..200).map(|i| ((i * 7) % 13) as f32 / 13.0 - 0.5).collect();
        let wf = Waveform::new(samples, 2, 100).unwrap();
        let out = Echo::new(0.3, 0.0).apply(&wf).unwrap();
        assert_eq!(out, wf);
    }

    #[test]
    fn test_zero_delay_is_identity() {
        let wf = Waveform::new(vec![0.3, -0.2, 0.9, 0.1], 2, 8).unwrap();
        let out = Echo::new(0.0, 0.5).apply(&wf).unwrap();
        assert_eq!(out, wf);
    }

    #[test]
    fn test_channels_echo_independently() {
        // Stereo impulse only on the right channel
        let wf = Waveform::new(vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0], 2, 2).unwrap();
        let out = Echo::new(0.5, 0.5).apply(&wf).unwrap();
        assert_eq!(out.channel(0), vec![0.0, 0.0, 0.0]);
        assert_eq!(out.channel(1), vec![1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_feedback_can_exceed_input_peak() {
        let wf = Waveform::new(vec![1.0; 8], 1, 4).unwrap();
        let out = Echo::new(0.25, 0.9).apply(&wf).unwrap();
        assert!(out.peak() > 1.0);
    }

    #[test]
    fn test_reapplying_changes_signal() {
        let wf = Waveform::new(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0], 1, 4).unwrap();
        let echo = Echo::new(0.25, 0.5);
        let once = echo.apply(&wf).unwrap();
        let twice = echo.apply(&once).unwrap();
        assert_ne!(once, twice);
    }

    #[test]
    fn test_negative_delay_rejected() {
        let wf = Waveform::new(vec![0.0; 4], 1, 4).unwrap();
        assert!(matches!(
            Echo::new(-1.0, 0.5).apply(&wf),
            Err(EffectError::InvalidParameter { name: "delay", .. })
        ));
    }

    #[test]
    fn test_input_left_untouched() {
        let wf = Waveform::new(vec![1.0, 0.0, 0.0, 0.0], 1, 4).unwrap();
        let copy = wf.clone();
        let _ = Echo::default().apply(&wf).unwrap();
        assert_eq!(wf, copy);
    }
}
