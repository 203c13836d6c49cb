//! Effect engine for Tono
//!
//! This crate provides the offline processing core:
//! - Waveform: interleaved PCM buffer with shape validation
//! - Resample: fractional-index reads, peak normalization, rate conversion
//! - Effects: Robot/Pitufo/Low warps, Echo, Flanger, band filters
//! - Playback: fire-and-forget output on the default device

mod effects;
mod playback;
pub mod resample;
mod waveform;

pub use effects::{BandFilter, Echo, Effect, EffectError, FilterType, Flanger, Modulation, ModulationShape};
pub use playback::{PlaybackError, Player};
pub use resample::ResampleError;
pub use waveform::{Waveform, WaveformError};
