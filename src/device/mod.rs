//! Sound devices: the hardware ring buffer the producer writes into and the play
//! cursor the consumer advances on its own.
//!
//! Both sides share one [`SharedRing`] of stereo frames, one atomic word per frame.
//! Neither side blocks: the producer only stores into the range between its own
//! cursor and the play cursor plus latency, the consumer only loads at the play
//! cursor, and the range arithmetic keeps the two apart.

pub mod hardware;
pub mod memory;

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::{BYTES_PER_FRAME, CHANNELS};
use crate::error::{DeviceError, Result};
use crate::ring::{split_range, Region};
use crate::tone::unpack_frame;

pub use hardware::CpalDevice;
pub use memory::{FrameClock, MemoryDevice};

/// The operations the ring writer needs from an output device.
pub trait SoundDevice {
    /// Ring size in bytes. Fixed for the life of the device.
    fn capacity_bytes(&self) -> usize;

    /// Byte offset the device has played up to.
    fn play_cursor(&self) -> Result<usize>;

    /// Reserves `count` bytes starting at `start`, split in two if the range runs
    /// past the end of the ring. Both must be whole frames.
    fn lock(&mut self, start: usize, count: usize) -> Result<LockedRegions<'_>>;

    /// Commits a finished lock. The receipt must match the outstanding lock.
    fn unlock(&mut self, receipt: LockReceipt) -> Result<()>;

    /// Starts playback from the beginning of the ring.
    fn play(&mut self, looping: bool) -> Result<()>;
}

/// Ring storage plus the consumer's play cursor.
pub struct SharedRing {
    frames: Box<[AtomicU32]>,
    capacity: usize,
    play_cursor: AtomicUsize,
    playing: AtomicBool,
    looping: AtomicBool,
    /// Set while a [`LockedRegions`] is alive. Only producers check it.
    writer: AtomicBool,
}

/// What one consumer pull did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumption {
    /// Not playing; output is silence and the cursor did not move.
    Stopped,
    /// Frames were copied out of the ring.
    Played,
    /// A one-shot playback reached the end of the ring during this pull.
    Finished,
}

impl SharedRing {
    /// Creates a zeroed (silent) ring. Playback is stopped until [`SharedRing::start`].
    /// A trailing partial frame is dropped from the capacity.
    pub fn new(capacity_bytes: usize) -> Self {
        let frames = capacity_bytes / BYTES_PER_FRAME;
        SharedRing {
            frames: (0..frames).map(|_| AtomicU32::new(0)).collect(),
            capacity: frames * BYTES_PER_FRAME,
            play_cursor: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            looping: AtomicBool::new(false),
            writer: AtomicBool::new(false),
        }
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity
    }

    pub fn play_cursor(&self) -> usize {
        self.play_cursor.load(Ordering::Acquire)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Rewinds to the start of the ring and begins playing.
    pub fn start(&self, looping: bool) {
        self.looping.store(looping, Ordering::Release);
        self.play_cursor.store(0, Ordering::Release);
        self.playing.store(true, Ordering::Release);
    }

    /// Consumer side: fills `out` (interleaved stereo i16) from the play cursor and
    /// advances it, wrapping at the end of the ring. Never waits on the producer.
    /// A one-shot playback stops as soon as a pull reaches the end of the ring.
    pub fn consume(&self, out: &mut [i16]) -> Consumption {
        out.fill(0);
        if !self.is_playing() || self.frames.is_empty() {
            return Consumption::Stopped;
        }

        let len = self.frames.len();
        let wanted = out.len() / CHANNELS;
        let first = self.play_cursor() / BYTES_PER_FRAME;
        let looping = self.looping.load(Ordering::Acquire);
        let playable = if looping { wanted } else { wanted.min(len - first) };

        let mut index = first;
        for frame in out.chunks_exact_mut(CHANNELS).take(playable) {
            frame.copy_from_slice(&unpack_frame(self.frames[index].load(Ordering::Relaxed)));
            index = (index + 1) % len;
        }

        if !looping && first + playable == len {
            self.playing.store(false, Ordering::Release);
            self.play_cursor.store(0, Ordering::Release);
            return Consumption::Finished;
        }
        self.play_cursor.store(index * BYTES_PER_FRAME, Ordering::Release);
        Consumption::Played
    }

    /// Producer side: reserves `[start, start + count)` modulo capacity. Fails with
    /// `Busy` while another lock on this ring is still alive.
    pub fn lock_regions(&self, start: usize, count: usize) -> Result<LockedRegions<'_>> {
        if count == 0
            || count > self.capacity
            || start >= self.capacity
            || start % BYTES_PER_FRAME != 0
            || count % BYTES_PER_FRAME != 0
        {
            return Err(DeviceError::InvalidRange {
                start,
                count,
                capacity: self.capacity,
            });
        }
        if self
            .writer
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(DeviceError::Busy);
        }
        let (first, second) = split_range(start, count, self.capacity);
        Ok(LockedRegions {
            ring: self,
            first,
            second,
        })
    }

    /// The ring contents as device bytes.
    pub fn snapshot(&self) -> Vec<u8> {
        self.frames
            .iter()
            .flat_map(|frame| frame.load(Ordering::Relaxed).to_le_bytes())
            .collect()
    }
}

/// A granted lock: up to two writable runs of ring frames. Dropping it releases the
/// lock for the next writer.
pub struct LockedRegions<'a> {
    ring: &'a SharedRing,
    first: Region,
    second: Region,
}

impl<'a> LockedRegions<'a> {
    /// The frames at the requested start and the wrapped frames at offset 0 (possibly empty).
    pub fn regions(&self) -> (&[AtomicU32], &[AtomicU32]) {
        let frames = &self.ring.frames;
        (&frames[frame_range(self.first)], &frames[frame_range(self.second)])
    }

    pub fn first(&self) -> Region {
        self.first
    }

    pub fn second(&self) -> Region {
        self.second
    }

    pub fn receipt(&self) -> LockReceipt {
        LockReceipt {
            first: self.first,
            second: self.second,
        }
    }

    /// Releases the lock and returns the receipt to hand to `unlock`.
    pub fn finish(self) -> LockReceipt {
        self.receipt()
    }
}

impl Drop for LockedRegions<'_> {
    fn drop(&mut self) {
        self.ring.writer.store(false, Ordering::Release);
    }
}

fn frame_range(region: Region) -> Range<usize> {
    region.offset / BYTES_PER_FRAME..region.end() / BYTES_PER_FRAME
}

/// Describes a lock that has been written and is waiting to be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockReceipt {
    pub first: Region,
    pub second: Region,
}

/// A shared ring plus the bookkeeping that pairs each `lock` with its `unlock`.
pub(crate) struct RingHandle {
    ring: Arc<SharedRing>,
    outstanding: Option<LockReceipt>,
}

impl RingHandle {
    pub(crate) fn new(ring: Arc<SharedRing>) -> Self {
        RingHandle {
            ring,
            outstanding: None,
        }
    }

    pub(crate) fn ring(&self) -> &Arc<SharedRing> {
        &self.ring
    }

    pub(crate) fn lock(&mut self, start: usize, count: usize) -> Result<LockedRegions<'_>> {
        let locked = self.ring.lock_regions(start, count)?;
        self.outstanding = Some(locked.receipt());
        Ok(locked)
    }

    pub(crate) fn unlock(&mut self, receipt: LockReceipt) -> Result<()> {
        match self.outstanding {
            Some(outstanding) if outstanding == receipt => {
                self.outstanding = None;
                Ok(())
            }
            _ => Err(DeviceError::StaleUnlock),
        }
    }
}
