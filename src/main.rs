//! tonering CLI: a frame loop playing a keyboard-steered sine tone through a
//! ring-buffered output device.

use std::error::Error;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use tonering::capture::{default_capture_path, WavCapture};
use tonering::device::{CpalDevice, FrameClock, MemoryDevice, SoundDevice};
use tonering::engine::{AudioOutput, Engine};
use tonering::event::event_channel;
use tonering::game::GameInput;
use tonering::input::Keyboard;
use tonering::AudioConfig;

const EVENT_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Default system output device
    Cpal,
    /// In-process ring played by the wall clock; no hardware needed
    Memory,
}

#[derive(Parser, Debug)]
#[command(name = "tonering")]
#[command(about = "Ring-buffered sine tone. Up/Down change the note, Esc or q quits.")]
struct Cli {
    /// Output backend
    #[arg(long, value_enum, default_value = "cpal")]
    backend: Backend,

    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Ring buffer length in seconds
    #[arg(long, default_value = "1.0")]
    buffer_seconds: f32,

    /// Latency is sample_rate / latency_divisor samples
    #[arg(long, default_value = "20")]
    latency_divisor: u32,

    /// Tone amplitude (0-32767)
    #[arg(long, default_value = "10000")]
    volume: f32,

    /// Starting note in Hz
    #[arg(long, default_value = "261")]
    note: f32,

    /// Frame loop rate
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<f32>,

    /// Record what the memory backend plays to a WAV file
    #[arg(long)]
    record: bool,

    /// WAV path for --record (default: timestamped name in the current directory)
    #[arg(long, requires = "record")]
    output: Option<PathBuf>,
}

impl Cli {
    fn audio_config(&self) -> AudioConfig {
        AudioConfig {
            samples_per_second: self.sample_rate,
            buffer_frames: (self.sample_rate as f32 * self.buffer_seconds).round() as usize,
            latency_divisor: self.latency_divisor,
            volume: self.volume,
            initial_note: self.note,
            frames_per_second: self.fps,
            ..AudioConfig::default()
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.duration.and_then(|s| Duration::try_from_secs_f32(s).ok())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.audio_config();
    config.validate()?;

    println!("tonering: Up/Down change the note, Esc or q quits.");
    match cli.backend {
        Backend::Cpal => run_cpal(&cli, &config),
        Backend::Memory => run_memory(&cli, &config),
    }
}

fn run_cpal(cli: &Cli, config: &AudioConfig) -> Result<(), Box<dyn Error>> {
    if cli.record {
        log::warn!("--record only applies to the memory backend; ignoring");
    }

    let (events_tx, events_rx) = event_channel(EVENT_CAPACITY);
    let audio = match CpalDevice::open(config, events_tx)
        .and_then(|device| AudioOutput::new(device, config))
    {
        Ok(audio) => Some(audio.with_events(events_rx)),
        Err(e) => {
            log::warn!("audio disabled, running silent: {}", e);
            None
        }
    };

    let mut engine = Engine::new(config, audio);
    run_frames(&mut engine, config, cli.duration(), |_, _| Ok(()))?;
    log::info!("done, {} frames skipped their audio write", engine.skipped_frames());
    Ok(())
}

fn run_memory(cli: &Cli, config: &AudioConfig) -> Result<(), Box<dyn Error>> {
    let device = MemoryDevice::new(config.capacity_bytes());
    let mut engine = Engine::new(config, Some(AudioOutput::new(device, config)?));
    let mut clock = FrameClock::new(config.samples_per_second);

    let mut capture = if cli.record {
        let path = cli
            .output
            .clone()
            .unwrap_or_else(|| default_capture_path(chrono::Local::now()));
        log::info!("recording to {}", path.display());
        Some((WavCapture::create(&path, config.samples_per_second)?, path))
    } else {
        None
    };

    run_frames(&mut engine, config, cli.duration(), |engine, dt| {
        let frames = clock.frames_for(dt);
        if let Some(audio) = engine.audio() {
            let (samples, _) = audio.device().advance(frames);
            if let Some((capture, _)) = capture.as_mut() {
                capture.write_samples(&samples)?;
            }
        }
        Ok(())
    })?;

    if let Some((capture, path)) = capture {
        let frames = capture.finish()?;
        log::info!("wrote {} frames to {}", frames, path.display());
    }
    Ok(())
}

/// Runs input, the caller's per-frame hook, then the engine frame, paced to the
/// configured rate, until the player quits or `duration` runs out.
fn run_frames<D, F>(
    engine: &mut Engine<D>,
    config: &AudioConfig,
    duration: Option<Duration>,
    mut tick: F,
) -> Result<(), Box<dyn Error>>
where
    D: SoundDevice,
    F: FnMut(&Engine<D>, Duration) -> Result<(), Box<dyn Error>>,
{
    let frame_time = Duration::from_secs_f64(1.0 / config.frames_per_second as f64);
    let mut keyboard = if std::io::stdin().is_terminal() {
        Some(Keyboard::enable()?)
    } else {
        None
    };

    let started = Instant::now();
    let mut last = started;
    loop {
        let now = Instant::now();
        let dt = now - last;
        last = now;

        tick(engine, dt)?;
        let input = match keyboard.as_mut() {
            Some(keyboard) => keyboard.poll()?,
            None => GameInput::default(),
        };
        if !engine.frame(&input, dt.as_secs_f32()) {
            break;
        }
        if duration.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }

        if let Some(rest) = frame_time.checked_sub(now.elapsed()) {
            thread::sleep(rest);
        }
    }

    drop(keyboard);
    Ok(())
}
