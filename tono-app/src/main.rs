//! Tono - apply one audio effect to a file
//!
//! Decodes the input, runs a single effect over the whole buffer, and writes
//! the result as a WAV file.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tono_audio::{BandFilter, Echo, Effect, Flanger, Modulation, ModulationShape, Player};
use tono_library::{BitDepth, Config, WaveformLoader, WaveformWriter};

/// How often `play` checks whether the device has drained the buffer
const PLAYBACK_POLL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "tono", version, about = "Apply an audio effect to a file")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output encoding: 16, 24 or 32f
    #[arg(long, global = true)]
    bit_depth: Option<BitDepth>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args)]
struct Io {
    /// Input audio file
    input: PathBuf,
    /// Output WAV file
    output: PathBuf,
}

#[derive(Args)]
struct ModulationArgs {
    #[command(flatten)]
    io: Io,
    /// Modulation rate in Hz
    #[arg(long, allow_negative_numbers = true)]
    modulation_factor: Option<f32>,
    /// Read-offset scale
    #[arg(long, allow_negative_numbers = true)]
    pitch_factor: Option<f32>,
}

#[derive(Args)]
struct FilterArgs {
    #[command(flatten)]
    io: Io,
    /// Cutoff frequency in Hz
    #[arg(long)]
    cutoff: Option<f32>,
}

#[derive(Subcommand)]
enum Command {
    /// Wobbling robot voice
    Robot(ModulationArgs),
    /// High chipmunk voice
    Pitufo(ModulationArgs),
    /// Deep slowed-down voice
    Low(ModulationArgs),
    /// Feedback echo
    Echo {
        #[command(flatten)]
        io: Io,
        /// Delay between repeats in seconds
        #[arg(long)]
        delay: Option<f32>,
        /// Gain of each repeat
        #[arg(long, allow_negative_numbers = true)]
        decay: Option<f32>,
    },
    /// Sweeping comb flanger
    Flanger {
        #[command(flatten)]
        io: Io,
        /// Base delay in seconds
        #[arg(long)]
        delay: Option<f32>,
        /// LFO excursion in seconds
        #[arg(long, allow_negative_numbers = true)]
        depth: Option<f32>,
        /// LFO rate in Hz
        #[arg(long, allow_negative_numbers = true)]
        rate: Option<f32>,
    },
    /// Butterworth low-pass filter
    Lowpass(FilterArgs),
    /// Butterworth high-pass filter
    Highpass(FilterArgs),
    /// Cut a section out of the input
    Trim {
        #[command(flatten)]
        io: Io,
        /// Start time in seconds
        #[arg(long)]
        start: f64,
        /// Length in seconds
        #[arg(long)]
        duration: f64,
    },
    /// Play a file on the default output device
    Play {
        /// Input audio file
        input: PathBuf,
    },
    /// Write the effective settings to the config file
    SaveConfig,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let creating = matches!(cli.cmd, Command::SaveConfig);
    let mut config = match &cli.config {
        Some(path) if creating && !path.exists() => Config::default(),
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => Config::load(),
    };
    if let Some(bit_depth) = cli.bit_depth {
        config.bit_depth = bit_depth;
    }
    let writer = WaveformWriter::new(config.bit_depth);

    match cli.cmd {
        Command::Robot(args) => run_modulation(ModulationShape::Sine, args, &config, writer),
        Command::Pitufo(args) => run_modulation(ModulationShape::Ramp, args, &config, writer),
        Command::Low(args) => run_modulation(ModulationShape::InvertedRamp, args, &config, writer),
        Command::Echo { io, delay, decay } => {
            let echo = Echo::new(
                delay.unwrap_or(config.echo_delay),
                decay.unwrap_or(config.echo_decay),
            );
            run_effect(&echo, &io, writer)
        }
        Command::Flanger {
            io,
            delay,
            depth,
            rate,
        } => {
            let flanger = Flanger::new(
                delay.unwrap_or(config.flanger_delay),
                depth.unwrap_or(config.flanger_depth),
                rate.unwrap_or(config.flanger_rate),
            );
            run_effect(&flanger, &io, writer)
        }
        Command::Lowpass(args) => {
            let filter = BandFilter::low_pass(args.cutoff.unwrap_or(config.cutoff_frequency));
            run_effect(&filter, &args.io, writer)
        }
        Command::Highpass(args) => {
            let filter = BandFilter::high_pass(args.cutoff.unwrap_or(config.cutoff_frequency));
            run_effect(&filter, &args.io, writer)
        }
        Command::Trim {
            io,
            start,
            duration,
        } => {
            let waveform = load(&io.input)?;
            let trimmed = waveform.trim(start, duration);
            info!(start, duration, frames = trimmed.frames(), "trimmed");
            save(&writer, &trimmed, &io.output)
        }
        Command::Play { input } => play(&input),
        Command::SaveConfig => save_config(&config, cli.config.as_deref()),
    }
}

fn save_config(config: &Config, path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => {
            config
                .save_to(path)
                .with_context(|| format!("Failed to write config {}", path.display()))?;
            path.to_path_buf()
        }
        None => {
            config.save().context("Failed to write config")?;
            Config::config_path()
        }
    };
    info!(path = %path.display(), "config saved");
    Ok(())
}

/// Decode, apply one effect, encode
fn run_effect(effect: &dyn Effect, io: &Io, writer: WaveformWriter) -> anyhow::Result<()> {
    let waveform = load(&io.input)?;

    let started = Instant::now();
    let output = effect
        .apply(&waveform)
        .with_context(|| format!("{} failed on {}", effect.name(), io.input.display()))?;
    info!(
        effect = effect.name(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "applied"
    );

    save(&writer, &output, &io.output)
}

fn load(path: &std::path::Path) -> anyhow::Result<tono_audio::Waveform> {
    let waveform = WaveformLoader::new()
        .load(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    info!(
        path = %path.display(),
        channels = waveform.channels(),
        sample_rate = waveform.sample_rate(),
        secs = waveform.duration_secs(),
        "loaded"
    );
    Ok(waveform)
}

fn save(
    writer: &WaveformWriter,
    waveform: &tono_audio::Waveform,
    path: &std::path::Path,
) -> anyhow::Result<()> {
    writer
        .write(waveform, path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bit_depth = %writer.bit_depth(), "saved");
    Ok(())
}

/// Play to the end, blocking the caller
fn play(path: &std::path::Path) -> anyhow::Result<()> {
    let waveform = load(path)?;
    let mut player = Player::new();
    player.play(&waveform).context("Failed to start playback")?;

    while player.is_playing() {
        thread::sleep(PLAYBACK_POLL);
    }
    player.stop();
    Ok(())
}
