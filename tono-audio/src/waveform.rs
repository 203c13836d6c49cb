//! In-memory PCM buffer shared by every effect

use thiserror::Error;

/// Errors raised when a buffer shape is inconsistent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaveformError {
    #[error("Waveform must have at least one channel")]
    ZeroChannels,
    #[error("{channels} channels exceeds the supported maximum of {}", u16::MAX)]
    TooManyChannels { channels: usize },
    #[error("Sample rate must be positive")]
    ZeroSampleRate,
    #[error("{len} samples do not divide into frames of {channels} channels")]
    RaggedFrames { len: usize, channels: usize },
}

/// Decoded audio held as interleaved frames
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Interleaved samples (frame 0 ch 0, frame 0 ch 1, ...)
    samples: Vec<f32>,
    /// Number of channels per frame
    channels: u16,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from interleaved samples
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self, WaveformError> {
        if channels == 0 {
            return Err(WaveformError::ZeroChannels);
        }
        if sample_rate == 0 {
            return Err(WaveformError::ZeroSampleRate);
        }
        if samples.len() % channels as usize != 0 {
            return Err(WaveformError::RaggedFrames {
                len: samples.len(),
                channels: channels as usize,
            });
        }

        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Create a waveform from planar channel data
    pub fn from_channels(planar: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, WaveformError> {
        let channels = planar.len();
        if channels == 0 {
            return Err(WaveformError::ZeroChannels);
        }
        if channels > u16::MAX as usize {
            return Err(WaveformError::TooManyChannels { channels });
        }

        let frames = planar[0].len();
        if let Some(bad) = planar.iter().find(|ch| ch.len() != frames) {
            return Err(WaveformError::RaggedFrames {
                len: bad.len(),
                channels,
            });
        }

        let mut interleaved = Vec::with_capacity(frames * channels);
        for frame_idx in 0..frames {
            for channel in &planar {
                interleaved.push(channel[frame_idx]);
            }
        }

        Self::new(interleaved, channels as u16, sample_rate)
    }

    /// Interleaved sample data
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// One frame (all channels at time index `t`)
    pub fn frame(&self, t: usize) -> &[f32] {
        let ch = self.channels as usize;
        &self.samples[t * ch..(t + 1) * ch]
    }

    /// Copy one channel out as a contiguous vector
    pub fn channel(&self, channel: usize) -> Vec<f32> {
        self.samples
            .iter()
            .skip(channel)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Peak absolute amplitude across all channels
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    /// Peak absolute amplitude of a single channel
    pub fn channel_peak(&self, channel: usize) -> f32 {
        self.samples
            .iter()
            .skip(channel)
            .step_by(self.channels as usize)
            .map(|s| s.abs())
            .fold(0.0f32, f32::max)
    }

    /// Cut out `duration_secs` starting at `start_secs`
    ///
    /// Bounds are truncated to whole frames and clamped to the buffer, so a
    /// window past the end yields an empty waveform.
    pub fn trim(&self, start_secs: f64, duration_secs: f64) -> Waveform {
        let sr = self.sample_rate as f64;
        let frames = self.frames();
        let to_frame = |secs: f64| ((secs * sr) as i64).clamp(0, frames as i64) as usize;

        let start = to_frame(start_secs);
        let end = to_frame(start_secs + duration_secs).max(start);
        let ch = self.channels as usize;

        Waveform {
            samples: self.samples[start * ch..end * ch].to_vec(),
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }
}
