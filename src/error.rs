//! Error types for the device layer, configuration, and WAV capture.

use thiserror::Error;

/// Failures reported by a sound device. None of these are fatal to the frame loop:
/// the caller logs them and skips this frame's audio write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// No output device, or the device refused every usable stream format.
    #[error("audio device unavailable: {0}")]
    Unavailable(String),

    /// The ring storage is held by the consumer right now. Retry next frame.
    #[error("device buffer is busy")]
    Busy,

    /// A lock request outside the ring, or for zero bytes.
    #[error("invalid lock range: start {start}, count {count}, capacity {capacity}")]
    InvalidRange {
        start: usize,
        count: usize,
        capacity: usize,
    },

    /// `unlock` was handed a receipt that does not match the outstanding lock.
    #[error("unlock does not match the outstanding lock")]
    StaleUnlock,

    /// Starting or running the output stream failed.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("samples per second must be positive")]
    ZeroSampleRate,

    #[error("latency divisor must be positive")]
    ZeroLatencyDivisor,

    #[error("buffer must hold at least one frame")]
    EmptyBuffer,

    #[error("latency of {latency} samples does not fit in a {capacity} sample buffer")]
    LatencyTooLarge { latency: usize, capacity: usize },

    #[error("volume {0} is outside the 16-bit sample range")]
    VolumeOutOfRange(f32),

    #[error("note {0} Hz must be positive and finite")]
    InvalidNote(f32),

    #[error("frame rate must be positive")]
    ZeroFrameRate,
}

/// Failures while recording played samples to a WAV file.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
