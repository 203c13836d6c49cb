//! Simple configuration persistence for Tono
//!
//! Stores the user's preferred effect parameters and export format.

use crate::writer::BitDepth;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tono_audio::{BandFilter, Echo, Flanger, Modulation};
use tracing::warn;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Sample encoding for exported files
    pub bit_depth: BitDepth,
    /// Robot/Pitufo/Low modulation rate (Hz)
    pub modulation_factor: f32,
    /// Robot/Pitufo/Low pitch scale
    pub pitch_factor: f32,
    /// Echo delay (seconds)
    pub echo_delay: f32,
    /// Echo feedback gain
    pub echo_decay: f32,
    /// Flanger base delay (seconds)
    pub flanger_delay: f32,
    /// Flanger LFO excursion (seconds)
    pub flanger_depth: f32,
    /// Flanger LFO rate (Hz)
    pub flanger_rate: f32,
    /// Low-pass/high-pass cutoff (Hz)
    pub cutoff_frequency: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bit_depth: BitDepth::default(),
            modulation_factor: Modulation::DEFAULT_MODULATION_FACTOR,
            pitch_factor: Modulation::DEFAULT_PITCH_FACTOR,
            echo_delay: Echo::DEFAULT_DELAY_SECS,
            echo_decay: Echo::DEFAULT_DECAY,
            flanger_delay: Flanger::DEFAULT_DELAY_SECS,
            flanger_depth: Flanger::DEFAULT_DEPTH_SECS,
            flanger_rate: Flanger::DEFAULT_RATE_HZ,
            cutoff_frequency: BandFilter::DEFAULT_CUTOFF_HZ,
        }
    }
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be read.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.serialize();
        fs::write(path, content)
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tono")
            .join("config.txt")
    }

    /// Parse config from simple key=value format
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if key == "bit_depth" {
                match value.parse() {
                    Ok(depth) => config.bit_depth = depth,
                    Err(e) => warn!(key, value, "ignoring config value: {}", e),
                }
                continue;
            }

            let slot = match key {
                "modulation_factor" => &mut config.modulation_factor,
                "pitch_factor" => &mut config.pitch_factor,
                "echo_delay" => &mut config.echo_delay,
                "echo_decay" => &mut config.echo_decay,
                "flanger_delay" => &mut config.flanger_delay,
                "flanger_depth" => &mut config.flanger_depth,
                "flanger_rate" => &mut config.flanger_rate,
                "cutoff_frequency" => &mut config.cutoff_frequency,
                _ => continue, // Ignore unknown keys
            };

            match value.parse::<f32>() {
                Ok(v) if v.is_finite() => *slot = v,
                _ => warn!(key, value, "ignoring non-numeric config value"),
            }
        }

        config
    }

    /// Serialize config to simple key=value format
    fn serialize(&self) -> String {
        [
            "# Tono Configuration".to_string(),
            format!("bit_depth={}", self.bit_depth),
            format!("modulation_factor={}", self.modulation_factor),
            format!("pitch_factor={}", self.pitch_factor),
            format!("echo_delay={}", self.echo_delay),
            format!("echo_decay={}", self.echo_decay),
            format!("flanger_delay={}", self.flanger_delay),
            format!("flanger_depth={}", self.flanger_depth),
            format!("flanger_rate={}", self.flanger_rate),
            format!("cutoff_frequency={}", self.cutoff_frequency),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert_eq!(Config::parse(""), Config::default());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bit_depth, BitDepth::Pcm16);
        assert_eq!(config.modulation_factor, 0.1);
        assert_eq!(config.pitch_factor, 0.9);
        assert_eq!(config.echo_delay, 0.7);
        assert_eq!(config.echo_decay, 0.5);
        assert_eq!(config.flanger_delay, 0.003);
        assert_eq!(config.flanger_depth, 0.002);
        assert_eq!(config.flanger_rate, 0.2);
        assert_eq!(config.cutoff_frequency, 1800.0);
    }

    #[test]
    fn test_parse_with_comments() {
        let content = "# Comment\necho_decay = 0.25\n# Another comment\nbit_depth=24";
        let config = Config::parse(content);
        assert_eq!(config.echo_decay, 0.25);
        assert_eq!(config.bit_depth, BitDepth::Pcm24);
        assert_eq!(config.echo_delay, 0.7);
    }

    #[test]
    fn test_bad_values_ignored() {
        let content = "pitch_factor=fast\ncutoff_frequency=inf\nbit_depth=7\nmystery=1";
        assert_eq!(Config::parse(content), Config::default());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir()
            .join(format!("tono-config-{}", std::process::id()))
            .join("config.txt");
        let config = Config {
            flanger_rate: 1.5,
            cutoff_frequency: 400.0,
            bit_depth: BitDepth::Float32,
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path);
        let _ = fs::remove_dir_all(path.parent().unwrap());

        assert_eq!(loaded.unwrap(), config);
    }
}
