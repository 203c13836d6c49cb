//! Device playback for a finished waveform

use crate::resample::{resample, ResampleError};
use crate::waveform::Waveform;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Errors that can occur while starting playback
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("No audio output device found")]
    NoDevice,
    #[error("Failed to get audio config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("Failed to create audio stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("Failed to start audio: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error(transparent)]
    Resample(#[from] ResampleError),
}

/// Plays one waveform at a time on the default output device
///
/// Playback runs on the device callback; `play` returns immediately.
#[derive(Default)]
pub struct Player {
    stream: Option<cpal::Stream>,
    finished: Arc<AtomicBool>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `waveform`, replacing anything already playing
    pub fn play(&mut self, waveform: &Waveform) -> Result<(), PlaybackError> {
        self.stop();

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;
        let config = device.default_output_config()?;

        let device_rate = config.sample_rate().0;
        let device_channels = config.channels() as usize;

        let source = resample(waveform, device_rate)?;
        info!(
            frames = source.frames(),
            device_rate,
            device_channels,
            "starting playback"
        );

        let finished = Arc::new(AtomicBool::new(false));
        let finished_cb = finished.clone();
        let finished_err = finished.clone();
        let mut cursor = FrameCursor::new(source);

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if cursor.fill(data, device_channels) {
                    finished_cb.store(true, Ordering::Release);
                }
            },
            move |err| stream_failed(&finished_err, err),
            None,
        )?;
        stream.play()?;

        self.finished = finished;
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop playback and release the device
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            info!("playback stopped");
        }
        self.finished.store(true, Ordering::Release);
    }

    /// True while a stream is open and has frames left
    pub fn is_playing(&self) -> bool {
        self.stream.is_some() && !self.finished.load(Ordering::Acquire)
    }
}

/// A broken stream never drains, so treat it as finished
fn stream_failed(finished: &AtomicBool, err: cpal::StreamError) {
    error!("Audio stream error: {}", err);
    finished.store(true, Ordering::Release);
}

/// Walks a waveform frame by frame, mapping it onto the device layout
struct FrameCursor {
    source: Waveform,
    position: usize,
}

impl FrameCursor {
    fn new(source: Waveform) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// Fill an interleaved device buffer; returns true once the source is exhausted
    ///
    /// Device channels beyond the source's repeat its last channel.
    fn fill(&mut self, data: &mut [f32], device_channels: usize) -> bool {
        let src_channels = self.source.channels() as usize;
        let frames = self.source.frames();

        for out in data.chunks_mut(device_channels.max(1)) {
            if self.position >= frames {
                out.fill(0.0);
                continue;
            }

            let frame = self.source.frame(self.position);
            for (ch, sample) in out.iter_mut().enumerate() {
                *sample = frame[ch.min(src_channels - 1)];
            }
            self.position += 1;
        }

        self.position >= frames
    }
}
