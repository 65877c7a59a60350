//! Audio and frame-loop configuration. Defaults match a 48 kHz stereo i16 device
//! with one second of ring buffer.

use crate::error::ConfigError;

/// Interleaved channels written per frame. The tone is mono duplicated to both.
pub const CHANNELS: usize = 2;
/// Bytes in one i16 sample.
pub const BYTES_PER_SAMPLE: usize = 2;
/// Bytes in one stereo sample pair.
pub const BYTES_PER_FRAME: usize = CHANNELS * BYTES_PER_SAMPLE;

/// Everything the audio context and frame loop need to know up front.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioConfig {
    /// Sample rate in Hz (e.g. 48_000). Must match the device stream.
    pub samples_per_second: u32,
    /// Ring size in frames. One second of audio by default.
    pub buffer_frames: usize,
    /// Look-ahead latency is `samples_per_second / latency_divisor` samples.
    /// 20 gives 50 ms, which holds up at 30 fps with some slack.
    pub latency_divisor: u32,
    /// Peak amplitude of the tone.
    pub volume: f32,
    /// Starting note in Hz (middle C).
    pub initial_note: f32,
    /// Notes are clamped to at least this many Hz before reaching the generator.
    pub min_note: f32,
    /// How fast the held arrow keys move the note, in Hz per second.
    pub note_slew: f32,
    /// Target frame loop rate.
    pub frames_per_second: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            samples_per_second: 48_000,
            buffer_frames: 48_000,
            latency_divisor: 20,
            volume: 10_000.0,
            initial_note: 261.0,
            min_note: 20.0,
            note_slew: 100.0,
            frames_per_second: 30,
        }
    }
}

impl AudioConfig {
    /// Bytes per stereo frame.
    pub fn bytes_per_frame(&self) -> usize {
        BYTES_PER_FRAME
    }

    /// Total ring size in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.buffer_frames * BYTES_PER_FRAME
    }

    /// Samples the producer keeps buffered ahead of the play cursor.
    pub fn latency_samples(&self) -> usize {
        (self.samples_per_second / self.latency_divisor.max(1)) as usize
    }

    /// Checks every field the audio path divides by or indexes with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples_per_second == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.latency_divisor == 0 {
            return Err(ConfigError::ZeroLatencyDivisor);
        }
        if self.buffer_frames == 0 {
            return Err(ConfigError::EmptyBuffer);
        }
        if self.frames_per_second == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        let latency = self.latency_samples();
        if latency >= self.buffer_frames {
            return Err(ConfigError::LatencyTooLarge {
                latency,
                capacity: self.buffer_frames,
            });
        }
        if !(0.0..=i16::MAX as f32).contains(&self.volume) {
            return Err(ConfigError::VolumeOutOfRange(self.volume));
        }
        for note in [self.initial_note, self.min_note] {
            if !note.is_finite() || note <= 0.0 {
                return Err(ConfigError::InvalidNote(note));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::AudioConfig;
    use crate::error::ConfigError;

    #[test]
    /// Test that the defaults validate and give one second of stereo i16.
    fn test_default_config_is_valid() {
        let config = AudioConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.capacity_bytes(), 48_000 * 4);
        assert_eq!(config.latency_samples(), 2_400);
    }

    #[test]
    fn test_zero_divisor_rejected() {
        let config = AudioConfig {
            latency_divisor: 0,
            ..AudioConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroLatencyDivisor));
    }

    #[test]
    /// Test that a latency that would swallow the whole ring is rejected.
    fn test_latency_larger_than_buffer_rejected() {
        let config = AudioConfig {
            buffer_frames: 1_000,
            latency_divisor: 1,
            ..AudioConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LatencyTooLarge { latency: 48_000, capacity: 1_000 })
        ));
    }

    #[test]
    fn test_non_positive_notes_rejected() {
        let config = AudioConfig {
            min_note: 0.0,
            ..AudioConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidNote(0.0)));

        let config = AudioConfig {
            initial_note: f32::NAN,
            ..AudioConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidNote(_))));
    }

    #[test]
    fn test_volume_out_of_range_rejected() {
        let config = AudioConfig {
            volume: 40_000.0,
            ..AudioConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::VolumeOutOfRange(40_000.0)));
    }
}
