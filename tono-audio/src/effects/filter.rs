//! Biquad band filter (low-pass, high-pass)

use super::{Effect, EffectError};
use crate::waveform::Waveform;
use std::f64::consts::PI;
use tracing::debug;

/// Filter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum FilterType {
    #[default]
    LowPass,
    HighPass,
}

/// Normalized biquad coefficients (a0 folded in)
#[derive(Debug, Clone, Copy)]
struct Coefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

/// Direct form I history for one channel
#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl ChannelState {
    #[inline]
    fn process(&mut self, c: &Coefficients, input: f64) -> f64 {
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Low-pass or high-pass filter with a Butterworth response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandFilter {
    pub filter_type: FilterType,
    /// Cutoff frequency in Hz
    pub cutoff_hz: f32,
}

impl BandFilter {
    pub const DEFAULT_CUTOFF_HZ: f32 = 1800.0;

    /// Butterworth Q
    const RESONANCE: f64 = std::f64::consts::FRAC_1_SQRT_2;

    pub fn new(filter_type: FilterType, cutoff_hz: f32) -> Self {
        Self {
            filter_type,
            cutoff_hz,
        }
    }

    pub fn low_pass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz)
    }

    pub fn high_pass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz)
    }

    /// Calculate biquad coefficients for `sample_rate`
    fn coefficients(&self, sample_rate: u32) -> Coefficients {
        let nyquist = sample_rate as f64 / 2.0;
        // Keep the pole pair inside the unit circle
        let cutoff = (self.cutoff_hz as f64).min(nyquist * 0.99);

        let omega = 2.0 * PI * cutoff / sample_rate as f64;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * Self::RESONANCE);

        let (b0, b1, b2) = match self.filter_type {
            FilterType::LowPass => {
                let b = (1.0 - cos_omega) / 2.0;
                (b, 1.0 - cos_omega, b)
            }
            FilterType::HighPass => {
                let b = (1.0 + cos_omega) / 2.0;
                (b, -(1.0 + cos_omega), b)
            }
        };
        let a0 = 1.0 + alpha;

        Coefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

impl Default for BandFilter {
    fn default() -> Self {
        Self::low_pass(Self::DEFAULT_CUTOFF_HZ)
    }
}

impl Effect for BandFilter {
    fn apply(&self, input: &Waveform) -> Result<Waveform, EffectError> {
        if !(self.cutoff_hz.is_finite() && self.cutoff_hz > 0.0) {
            return Err(EffectError::InvalidParameter {
                name: "cutoff_frequency",
                value: self.cutoff_hz,
            });
        }

        let coeffs = self.coefficients(input.sample_rate());
        let channels = input.channels() as usize;
        let mut states = vec![ChannelState::default(); channels];

        debug!(filter = self.name(), cutoff = self.cutoff_hz, frames = input.frames(), "filter");

        let mut out = Vec::with_capacity(input.samples().len());
        for frame in input.samples().chunks(channels) {
            for (sample, state) in frame.iter().zip(states.iter_mut()) {
                out.push(state.process(&coeffs, *sample as f64) as f32);
            }
        }

        Ok(Waveform::new(out, input.channels(), input.sample_rate())?)
    }

    fn name(&self) -> &'static str {
        match self.filter_type {
            FilterType::LowPass => "LP Filter",
            FilterType::HighPass => "HP Filter",
        }
    }
}
