//! File I/O for Tono - decoding, WAV export, and configuration

mod config;
mod loader;
mod writer;

pub use config::Config;
pub use loader::{LoadError, WaveformLoader};
pub use writer::{BitDepth, WaveformWriter, WriteError};
