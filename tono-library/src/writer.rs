//! WAV export

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tono_audio::Waveform;
use tracing::debug;

/// Errors that can occur while writing an output file
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encode error: {0}")]
    Encode(#[from] hound::Error),
}

/// Sample encoding of the exported WAV file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum BitDepth {
    /// 16-bit signed integer PCM
    #[default]
    Pcm16,
    /// 24-bit signed integer PCM
    Pcm24,
    /// 32-bit IEEE float
    Float32,
}

impl BitDepth {
    fn spec(self, waveform: &Waveform) -> hound::WavSpec {
        let (bits_per_sample, sample_format) = match self {
            BitDepth::Pcm16 => (16, hound::SampleFormat::Int),
            BitDepth::Pcm24 => (24, hound::SampleFormat::Int),
            BitDepth::Float32 => (32, hound::SampleFormat::Float),
        };

        hound::WavSpec {
            channels: waveform.channels(),
            sample_rate: waveform.sample_rate(),
            bits_per_sample,
            sample_format,
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitDepth::Pcm16 => write!(f, "16"),
            BitDepth::Pcm24 => write!(f, "24"),
            BitDepth::Float32 => write!(f, "32f"),
        }
    }
}

impl FromStr for BitDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16" => Ok(BitDepth::Pcm16),
            "24" => Ok(BitDepth::Pcm24),
            "32f" | "float" => Ok(BitDepth::Float32),
            other => Err(format!("Unsupported bit depth: {}", other)),
        }
    }
}

/// Writes waveforms as WAV files using hound
///
/// Output goes to a sibling temporary file that is renamed into place only
/// after the whole buffer has been encoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaveformWriter {
    bit_depth: BitDepth,
}

impl WaveformWriter {
    pub fn new(bit_depth: BitDepth) -> Self {
        Self { bit_depth }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Encode `waveform` to `path`
    pub fn write(&self, waveform: &Waveform, path: &Path) -> Result<(), WriteError> {
        let partial = Self::partial_path(path);

        let result = self
            .encode(waveform, &partial)
            .and_then(|()| std::fs::rename(&partial, path).map_err(WriteError::from));

        if result.is_err() {
            let _ = std::fs::remove_file(&partial);
        } else {
            debug!(
                path = %path.display(),
                frames = waveform.frames(),
                bit_depth = %self.bit_depth,
                "wrote"
            );
        }

        result
    }

    fn encode(&self, waveform: &Waveform, path: &Path) -> Result<(), WriteError> {
        let mut writer = hound::WavWriter::create(path, self.bit_depth.spec(waveform))?;

        match self.bit_depth {
            BitDepth::Pcm16 => {
                for &sample in waveform.samples() {
                    writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?;
                }
            }
            BitDepth::Pcm24 => {
                for &sample in waveform.samples() {
                    writer.write_sample((sample.clamp(-1.0, 1.0) * 8388607.0) as i32)?;
                }
            }
            BitDepth::Float32 => {
                for &sample in waveform.samples() {
                    writer.write_sample(sample)?;
                }
            }
        }

        writer.finalize()?;
        Ok(())
    }

    /// `out.wav` -> `.out.wav.partial` in the same directory
    fn partial_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        path.with_file_name(format!(".{}.partial", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tono-writer-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_pcm16_clamps_overshoot() {
        let path = temp_path("clamp.wav");
        let wf = Waveform::new(vec![2.0, -3.0, 0.5, 0.0], 2, 8000).unwrap();
        WaveformWriter::new(BitDepth::Pcm16).write(&wf, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        let _ = std::fs::remove_file(&path);

        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(samples, vec![32767, -32767, 16383, 0]);
    }

    #[test]
    fn test_no_partial_file_left_on_failure() {
        let dir = temp_path("missing-dir");
        let path = dir.join("out.wav");
        let wf = Waveform::new(vec![0.0; 4], 1, 8000).unwrap();

        let result = WaveformWriter::default().write(&wf, &path);
        assert!(result.is_err());
        assert!(!path.exists());
        assert!(!WaveformWriter::partial_path(&path).exists());
    }

    #[test]
    fn test_partial_path_is_sibling() {
        let partial = WaveformWriter::partial_path(Path::new("/tmp/x/out.wav"));
        assert_eq!(partial, PathBuf::from("/tmp/x/.out.wav.partial"));
    }

    #[test]
    fn test_bit_depth_parse() {
        assert_eq!("16".parse::<BitDepth>(), Ok(BitDepth::Pcm16));
        assert_eq!("24".parse::<BitDepth>(), Ok(BitDepth::Pcm24));
        assert_eq!("32f".parse::<BitDepth>(), Ok(BitDepth::Float32));
        assert!("8".parse::<BitDepth>().is_err());
        assert_eq!(BitDepth::Float32.to_string(), "32f");
    }
}
