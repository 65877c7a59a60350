//! In-process device whose play cursor moves only when the caller says so.
//! Drives headless runs (paired with a [`FrameClock`]) and the tests.

use std::sync::Arc;
use std::time::Duration;

use crate::config::CHANNELS;
use crate::device::{Consumption, LockReceipt, LockedRegions, RingHandle, SharedRing, SoundDevice};
use crate::error::Result;

pub struct MemoryDevice {
    handle: RingHandle,
}

impl MemoryDevice {
    pub fn new(capacity_bytes: usize) -> Self {
        MemoryDevice {
            handle: RingHandle::new(Arc::new(SharedRing::new(capacity_bytes))),
        }
    }

    pub fn ring(&self) -> &Arc<SharedRing> {
        self.handle.ring()
    }

    /// Plays `frames` frames, moving the play cursor, and returns what was played
    /// as interleaved stereo samples.
    pub fn advance(&self, frames: usize) -> (Vec<i16>, Consumption) {
        let mut out = vec![0i16; frames * CHANNELS];
        let consumption = self.handle.ring().consume(&mut out);
        (out, consumption)
    }

    pub fn contents(&self) -> Vec<u8> {
        self.handle.ring().snapshot()
    }
}

impl SoundDevice for MemoryDevice {
    fn capacity_bytes(&self) -> usize {
        self.handle.ring().capacity_bytes()
    }

    fn play_cursor(&self) -> Result<usize> {
        Ok(self.handle.ring().play_cursor())
    }

    fn lock(&mut self, start: usize, count: usize) -> Result<LockedRegions<'_>> {
        self.handle.lock(start, count)
    }

    fn unlock(&mut self, receipt: LockReceipt) -> Result<()> {
        self.handle.unlock(receipt)
    }

    fn play(&mut self, looping: bool) -> Result<()> {
        self.handle.ring().start(looping);
        Ok(())
    }
}

/// Converts wall-clock time into whole frames at a fixed sample rate, carrying the
/// fractional remainder so nothing drifts over a long run.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    samples_per_second: u32,
    remainder: f64,
}

impl FrameClock {
    pub fn new(samples_per_second: u32) -> Self {
        FrameClock {
            samples_per_second,
            remainder: 0.0,
        }
    }

    /// Frames that became due during `elapsed`.
    pub fn frames_for(&mut self, elapsed: Duration) -> usize {
        let exact = elapsed.as_secs_f64() * self.samples_per_second as f64 + self.remainder;
        let whole = exact.floor();
        self.remainder = exact - whole;
        whole as usize
    }
}
