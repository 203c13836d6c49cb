//! Audio file loading and decoding

use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tono_audio::{Waveform, WaveformError};
use tracing::{debug, warn};

/// Errors that can occur while decoding an input file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Audio track does not declare a sample rate")]
    MissingSampleRate,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Waveform(#[from] WaveformError),
}

/// Audio file loader using Symphonia
///
/// Decodes at the file's native sample rate and channel count.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaveformLoader;

impl WaveformLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load and decode an audio file
    pub fn load(&self, path: &Path) -> Result<Waveform, LoadError> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create hint from file extension
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut format = probed.format;

        // Find first audio track
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(LoadError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or(LoadError::MissingSampleRate)?;
        let mut channels = codec_params.channels.map(|c| c.count() as u16);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(LoadError::Decode(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(msg)) => {
                    warn!(path = %path.display(), "skipping undecodable packet: {}", msg);
                    continue;
                }
                Err(e) => return Err(LoadError::Decode(e.to_string())),
            };

            // Convert to f32 interleaved
            let spec = *decoded.spec();
            if channels.is_none() {
                channels = Some(spec.channels.count() as u16);
            }
            let duration = decoded.capacity() as u64;

            let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
            sample_buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(sample_buf.samples());
        }

        let channels = channels.ok_or(LoadError::NoAudioTrack)?;
        let waveform = Waveform::new(samples, channels, sample_rate)?;

        debug!(
            path = %path.display(),
            frames = waveform.frames(),
            channels,
            sample_rate,
            "decoded"
        );

        Ok(waveform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{BitDepth, WaveformWriter};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tono-loader-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_missing_file() {
        let result = WaveformLoader::new().load(&temp_path("does-not-exist.wav"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_garbage_file() {
        let path = temp_path("garbage.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();
        let result = WaveformLoader::new().load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(LoadError::Decode(_))));
    }

    #[test]
    fn test_reads_back_written_wav() {
        let path = temp_path("stereo.wav");
        let samples: Vec<f32> = (0..2000).map(|i| ((i % 50) as f32 / 50.0) - 0.5).collect();
        let original = Waveform::new(samples, 2, 22050).unwrap();

        WaveformWriter::new(BitDepth::Float32)
            .write(&original, &path)
            .unwrap();
        let loaded = WaveformLoader::new().load(&path);
        let _ = std::fs::remove_file(&path);
        let loaded = loaded.unwrap();

        assert_eq!(loaded.channels(), 2);
        assert_eq!(loaded.sample_rate(), 22050);
        assert_eq!(loaded.frames(), 1000);
        for (a, b) in loaded.samples().iter().zip(original.samples()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
