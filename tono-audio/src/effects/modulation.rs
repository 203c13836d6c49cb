//! Time-warp voice effects: Robot, Pitufo and Low
//!
//! Each channel is re-read at `t + m(t) * sample_rate * pitch_factor` where
//! `m(t)` is built from the phase `2π · t / sample_rate · modulation_factor`:
//!
//! - Robot: `sin(phase)`, a slow wobble around the original timeline
//! - Pitufo: `phase`, a steadily faster read (chipmunk voice)
//! - Low: `-phase`, a steadily slower read (deep voice)
//!
//! The warped channel is then normalized to a peak of exactly 1.0.

use super::{check_finite, Effect, EffectError};
use crate::resample::{interpolate, normalize_peak};
use crate::waveform::Waveform;
use std::f64::consts::PI;
use tracing::debug;

/// How the modulation phase becomes a read-position offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ModulationShape {
    /// Phase passed through `sin()` (Robot)
    #[default]
    Sine,
    /// Raw phase (Pitufo)
    Ramp,
    /// Negated raw phase (Low)
    InvertedRamp,
}

impl ModulationShape {
    #[inline]
    fn offset(self, phase: f64) -> f64 {
        match self {
            ModulationShape::Sine => phase.sin(),
            ModulationShape::Ramp => phase,
            ModulationShape::InvertedRamp => -phase,
        }
    }
}

/// Per-channel index-warp effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulation {
    pub shape: ModulationShape,
    /// Rate of the phase ramp in Hz
    pub modulation_factor: f32,
    /// Scale from modulation value to read offset, in seconds
    pub pitch_factor: f32,
}

impl Modulation {
    pub const DEFAULT_MODULATION_FACTOR: f32 = 0.1;
    pub const DEFAULT_PITCH_FACTOR: f32 = 0.9;

    pub fn new(shape: ModulationShape, modulation_factor: f32, pitch_factor: f32) -> Self {
        Self {
            shape,
            modulation_factor,
            pitch_factor,
        }
    }

    /// Robot voice with default parameters
    pub fn robot() -> Self {
        Self::with_defaults(ModulationShape::Sine)
    }

    /// Pitufo (smurf) voice with default parameters
    pub fn pitufo() -> Self {
        Self::with_defaults(ModulationShape::Ramp)
    }

    /// Low voice with default parameters
    pub fn low() -> Self {
        Self::with_defaults(ModulationShape::InvertedRamp)
    }

    fn with_defaults(shape: ModulationShape) -> Self {
        Self::new(
            shape,
            Self::DEFAULT_MODULATION_FACTOR,
            Self::DEFAULT_PITCH_FACTOR,
        )
    }

    /// Fractional read positions for a channel of `frames` samples
    fn read_positions(&self, frames: usize, sample_rate: u32) -> Vec<f64> {
        let sr = sample_rate as f64;
        let phase_inc = 2.0 * PI / sr * self.modulation_factor as f64;
        let scale = sr * self.pitch_factor as f64;

        (0..frames)
            .map(|t| {
                let t = t as f64;
                t + self.shape.offset(phase_inc * t) * scale
            })
            .collect()
    }
}

impl Effect for Modulation {
    fn apply(&self, input: &Waveform) -> Result<Waveform, EffectError> {
        if input.channels() < 2 {
            return Err(EffectError::UnsupportedChannelLayout {
                effect: self.name(),
                channels: input.channels(),
            });
        }
        check_finite("modulation_factor", self.modulation_factor)?;
        check_finite("pitch_factor", self.pitch_factor)?;

        let positions = self.read_positions(input.frames(), input.sample_rate());

        let planar = (0..input.channels() as usize)
            .map(|ch| {
                let mut warped = interpolate(&input.channel(ch), &positions);
                if !normalize_peak(&mut warped) {
                    debug!(effect = self.name(), channel = ch, "silent channel left at zero");
                }
                warped
            })
            .collect();

        Ok(Waveform::from_channels(planar, input.sample_rate())?)
    }

    fn name(&self) -> &'static str {
        match self.shape {
            ModulationShape::Sine => "Robot",
            ModulationShape::Ramp => "Pitufo",
            ModulationShape::InvertedRamp => "Low",
        }
    }
}
