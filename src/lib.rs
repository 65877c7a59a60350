//! tonering library root. A frame loop keeps an audio device's hardware ring topped
//! up with a sine tone, writing only the bytes that sit between the producer's last
//! write and the play cursor plus latency. The binary in `main.rs` drives it.

pub mod capture;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod event;
pub mod game;
pub mod input;
pub mod ring;
pub mod spsc;
pub mod tone;

pub use config::AudioConfig;
pub use device::{CpalDevice, MemoryDevice, SoundDevice};
pub use engine::{AudioOutput, Engine};
pub use error::{CaptureError, ConfigError, DeviceError};
pub use ring::{compute_write_range, split_range, AudioRingBuffer, Region, WriteRange, WriteReport};
pub use tone::ToneState;
