//! Sine tone generation. The generator is a pure function of the absolute sample
//! position, so a block split anywhere (e.g. at the ring's physical end) produces
//! the same samples as one unsplit block.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicU32, Ordering};

/// One interleaved left/right sample pair.
pub type StereoFrame = [i16; 2];

/// Samples per full cycle of `note` Hz. Caller guarantees `note > 0`.
pub fn period(samples_per_second: u32, note: f32) -> f64 {
    samples_per_second as f64 / note as f64
}

/// The sample at absolute position `position` of a sine with the given period.
pub fn sample_at(position: u64, period: f64, volume: f32) -> i16 {
    let phase = (position as f64 / period).fract();
    let value = (2.0 * PI * phase).sin() * volume as f64;
    value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Generates `count` stereo frames starting at absolute position `start`.
/// Both channels carry the same sample.
pub fn generate(count: usize, start: u64, period: f64, volume: f32) -> Vec<StereoFrame> {
    (0..count as u64)
        .map(|i| {
            let sample = sample_at(start + i, period, volume);
            [sample, sample]
        })
        .collect()
}

/// Packs a frame into one ring word. The word's little-endian bytes are the frame's
/// byte layout on the device: left low, left high, right low, right high.
pub fn pack_frame(frame: StereoFrame) -> u32 {
    let [l0, l1] = frame[0].to_le_bytes();
    let [r0, r1] = frame[1].to_le_bytes();
    u32::from_le_bytes([l0, l1, r0, r1])
}

pub fn unpack_frame(word: u32) -> StereoFrame {
    let [l0, l1, r0, r1] = word.to_le_bytes();
    [i16::from_le_bytes([l0, l1]), i16::from_le_bytes([r0, r1])]
}

/// Stores one tone frame per slot of `region`, starting at absolute position
/// `start`. Returns the number of frames written.
pub fn fill_frames(region: &[AtomicU32], start: u64, period: f64, volume: f32) -> usize {
    for (i, slot) in region.iter().enumerate() {
        let sample = sample_at(start + i as u64, period, volume);
        slot.store(pack_frame([sample, sample]), Ordering::Relaxed);
    }
    region.len()
}

/// Note and phase carried across frames. Lives as long as the audio context.
#[derive(Clone, Debug, PartialEq)]
pub struct ToneState {
    note: f32,
    min_note: f32,
    samples_per_second: u32,
    /// Samples emitted so far, rebased on note changes so the phase fraction survives.
    phase_sample_counter: u64,
}

impl ToneState {
    /// Creates a tone at `note` Hz (clamped to `min_note`) with phase 0.
    pub fn new(samples_per_second: u32, note: f32, min_note: f32) -> Self {
        ToneState {
            note: clamp_note(note, min_note),
            min_note,
            samples_per_second,
            phase_sample_counter: 0,
        }
    }

    pub fn note(&self) -> f32 {
        self.note
    }

    pub fn phase_sample_counter(&self) -> u64 {
        self.phase_sample_counter
    }

    /// Samples per cycle at the current note.
    pub fn period(&self) -> f64 {
        period(self.samples_per_second, self.note)
    }

    /// Retunes the tone. Non-positive or non-finite notes are clamped to the minimum
    /// so the generator never sees a zero or infinite period.
    ///
    /// The counter is rebased so the current phase fraction maps to the same point
    /// of the new cycle, which keeps frequency sweeps free of clicks.
    pub fn set_note(&mut self, note: f32) -> f32 {
        let note = clamp_note(note, self.min_note);
        if note != self.note {
            let fraction = (self.phase_sample_counter as f64 / self.period()).fract();
            self.note = note;
            self.phase_sample_counter = (fraction * self.period()).round() as u64;
        }
        self.note
    }

    /// Moves the phase forward by `frames` samples.
    pub(crate) fn advance(&mut self, frames: u64) {
        self.phase_sample_counter += frames;
    }
}

fn clamp_note(note: f32, min_note: f32) -> f32 {
    if note.is_finite() {
        note.max(min_note)
    } else {
        min_note
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::{fill_frames, generate, pack_frame, period, sample_at, unpack_frame, ToneState};

    const VOLUME: f32 = 10_000.0;

    #[test]
    /// Test that generating N frames at once equals generating k and then N-k.
    fn test_generate_is_continuous_across_any_split() {
        let period = period(48_000, 261.0);
        let whole = generate(500, 1_234, period, VOLUME);
        for k in [0, 1, 137, 499, 500] {
            let mut split = generate(k, 1_234, period, VOLUME);
            split.extend(generate(500 - k, 1_234 + k as u64, period, VOLUME));
            assert_eq!(whole, split, "discontinuity at split {}", k);
        }
    }

    #[test]
    /// Test that no sample exceeds the volume.
    fn test_amplitude_is_bounded_by_volume() {
        let frames = generate(4_800, 0, period(48_000, 313.0), VOLUME);
        assert!(frames
            .iter()
            .all(|f| (f[0] as f32).abs() <= VOLUME && (f[1] as f32).abs() <= VOLUME));
        let peak = frames.iter().map(|f| f[0].unsigned_abs()).max().unwrap();
        assert!(peak as f32 > VOLUME * 0.99, "peak {} should reach volume", peak);
    }

    #[test]
    /// Test that output repeats every `samples_per_second / note` samples.
    fn test_output_is_periodic() {
        // 48_000 / 480 = exactly 100 samples per cycle.
        let period = period(48_000, 480.0);
        let frames = generate(300, 0, period, VOLUME);
        for i in 0..200 {
            assert_eq!(frames[i], frames[i + 100]);
        }
    }

    #[test]
    fn test_left_and_right_are_identical() {
        let frames = generate(64, 7, period(48_000, 440.0), VOLUME);
        assert!(frames.iter().all(|f| f[0] == f[1]));
    }

    #[test]
    fn test_sample_at_quarter_cycle_is_peak() {
        assert_eq!(sample_at(0, 100.0, VOLUME), 0);
        assert_eq!(sample_at(25, 100.0, VOLUME), 10_000);
        assert_eq!(sample_at(75, 100.0, VOLUME), -10_000);
    }

    #[test]
    /// Test that full-scale volume never wraps around the i16 range.
    fn test_full_scale_volume_clamps() {
        let frames = generate(100, 0, 100.0, 40_000.0);
        assert_eq!(frames[25][0], i16::MAX);
        assert_eq!(frames[75][0], i16::MIN);
    }

    #[test]
    /// Test that a packed frame's bytes are little-endian left then right.
    fn test_pack_frame_byte_layout() {
        let word = pack_frame([0x0102, -2]);
        assert_eq!(word.to_le_bytes(), [0x02, 0x01, 0xFE, 0xFF]);
        assert_eq!(unpack_frame(word), [0x0102, -2]);
    }

    #[test]
    /// Test that fill_frames matches generate sample for sample.
    fn test_fill_frames_matches_generate() {
        let period = period(48_000, 261.0);
        let region: Vec<AtomicU32> = (0..64).map(|_| AtomicU32::new(0)).collect();
        assert_eq!(fill_frames(&region, 99, period, VOLUME), 64);
        let written: Vec<_> = region
            .iter()
            .map(|slot| unpack_frame(slot.load(Ordering::Relaxed)))
            .collect();
        assert_eq!(written, generate(64, 99, period, VOLUME));
    }

    #[test]
    fn test_fill_frames_empty_region() {
        assert_eq!(fill_frames(&[], 0, 100.0, VOLUME), 0);
    }

    #[test]
    /// Test that invalid notes are clamped to the minimum instead of reaching the generator.
    fn test_set_note_clamps_invalid_notes() {
        let mut tone = ToneState::new(48_000, 261.0, 20.0);
        assert_eq!(tone.set_note(0.0), 20.0);
        assert_eq!(tone.set_note(-50.0), 20.0);
        assert_eq!(tone.set_note(f32::NAN), 20.0);
        assert_eq!(tone.set_note(f32::INFINITY), 20.0);
        assert!(tone.period().is_finite());
        assert_eq!(ToneState::new(48_000, 0.0, 20.0).note(), 20.0);
    }

    #[test]
    /// Test that retuning keeps the phase fraction instead of jumping.
    fn test_set_note_preserves_phase_fraction() {
        let mut tone = ToneState::new(48_000, 480.0, 20.0);
        // A quarter of the way through a 100-sample cycle.
        tone.advance(1_025);
        tone.set_note(240.0);
        // Same fraction of a 200-sample cycle.
        assert_eq!(tone.phase_sample_counter(), 50);
        assert_eq!(sample_at(tone.phase_sample_counter(), tone.period(), VOLUME), 10_000);
    }

    #[test]
    fn test_set_note_same_value_keeps_counter() {
        let mut tone = ToneState::new(48_000, 261.0, 20.0);
        tone.advance(12_345);
        tone.set_note(261.0);
        assert_eq!(tone.phase_sample_counter(), 12_345);
    }
}
