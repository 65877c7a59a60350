//! Records what a device plays to a 16-bit stereo WAV file.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::config::CHANNELS;
use crate::error::CaptureError;

pub struct WavCapture {
    writer: hound::WavWriter<BufWriter<File>>,
    frames: u64,
}

impl WavCapture {
    pub fn create(path: impl AsRef<Path>, samples_per_second: u32) -> Result<Self, CaptureError> {
        let spec = hound::WavSpec {
            channels: CHANNELS as u16,
            sample_rate: samples_per_second,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        Ok(WavCapture { writer, frames: 0 })
    }

    /// Appends interleaved stereo samples. A trailing half frame is ignored.
    pub fn write_samples(&mut self, interleaved: &[i16]) -> Result<(), CaptureError> {
        for frame in interleaved.chunks_exact(CHANNELS) {
            for &sample in frame {
                self.writer.write_sample(sample)?;
            }
            self.frames += 1;
        }
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Writes the header sizes and closes the file. Returns the frame count.
    pub fn finish(self) -> Result<u64, CaptureError> {
        let frames = self.frames;
        self.writer.finalize()?;
        Ok(frames)
    }
}

/// `capture-YYYYmmdd-HHMMSS.wav` for the given moment.
pub fn default_capture_path<Tz: TimeZone>(now: DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    PathBuf::from(format!("capture-{}.wav", now.format("%Y%m%d-%H%M%S")))
}
