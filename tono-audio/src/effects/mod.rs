//! Audio effects for Tono
//!
//! Every effect reads a whole [`Waveform`] and returns a new one; the input
//! buffer is never modified.

mod echo;
mod filter;
mod flanger;
mod modulation;

pub use echo::Echo;
pub use filter::{BandFilter, FilterType};
pub use flanger::Flanger;
pub use modulation::{Modulation, ModulationShape};

use crate::waveform::{Waveform, WaveformError};
use thiserror::Error;

/// Errors that can occur while applying an effect
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    #[error("{effect} needs a multi-channel buffer, got {channels} channel(s)")]
    UnsupportedChannelLayout { effect: &'static str, channels: u16 },
    #[error("Invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },
    #[error(transparent)]
    Waveform(#[from] WaveformError),
}

/// Trait for offline audio effects
pub trait Effect: Send {
    /// Produce the effected copy of `input`
    fn apply(&self, input: &Waveform) -> Result<Waveform, EffectError>;

    /// Get effect name
    fn name(&self) -> &'static str;
}

/// Reject negative or non-finite parameter values
pub(crate) fn check_non_negative(name: &'static str, value: f32) -> Result<(), EffectError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EffectError::InvalidParameter { name, value })
    }
}

/// Reject non-finite parameter values; any sign is allowed
pub(crate) fn check_finite(name: &'static str, value: f32) -> Result<(), EffectError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EffectError::InvalidParameter { name, value })
    }
}

/// Seconds to the nearest whole number of frames, keeping the sign
pub(crate) fn secs_to_frames(secs: f32, sample_rate: u32) -> f64 {
    (secs as f64 * sample_rate as f64).round()
}
