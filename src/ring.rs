//! Producer side of the hardware ring: which bytes are safe to overwrite this frame,
//! and writing the tone into them.
//!
//! The device plays from its own cursor `P` while we write. Each frame we aim to have
//! everything up to `P + latency` filled, starting from where we stopped last time
//! (`S`). Bytes between `P` and `S` are queued audio and are never touched.

use crate::device::SoundDevice;
use crate::error::{DeviceError, Result};
use crate::tone::{self, ToneState};

/// A contiguous byte span of the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub offset: usize,
    pub len: usize,
}

impl Region {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Splits `count` bytes from `start` into the part before the physical end of the
/// ring and the part that wraps to offset 0. The second region is empty unless the
/// first one reaches `capacity`.
pub fn split_range(start: usize, count: usize, capacity: usize) -> (Region, Region) {
    let first_len = count.min(capacity - start);
    (
        Region {
            offset: start,
            len: first_len,
        },
        Region {
            offset: 0,
            len: count - first_len,
        },
    )
}

/// Bytes to write this frame, starting at the producer's offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRange {
    pub start: usize,
    pub len: usize,
}

/// Computes the writable range for play cursor `play_cursor`, `latency_samples` of
/// look-ahead, and producer offset `producer_offset`.
///
/// When the producer already sits on the target, a cold ring (nothing written yet)
/// gets the whole buffer; a warm ring gets nothing, since every byte from the play
/// cursor up to the target is still queued.
pub fn compute_write_range(
    play_cursor: usize,
    latency_samples: usize,
    producer_offset: usize,
    capacity_bytes: usize,
    bytes_per_frame: usize,
    cold: bool,
) -> WriteRange {
    let target = (play_cursor + latency_samples * bytes_per_frame) % capacity_bytes;
    let len = if producer_offset > target {
        (capacity_bytes - producer_offset) + target
    } else if producer_offset < target {
        target - producer_offset
    } else if cold {
        capacity_bytes
    } else {
        0
    };
    WriteRange {
        start: producer_offset,
        len,
    }
}

/// What one successful write covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    pub first: Region,
    pub second: Region,
    pub frames: usize,
}

/// Producer cursor into the device ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRingBuffer {
    capacity_bytes: usize,
    bytes_per_frame: usize,
    /// Next frame slot to fill. Always `< capacity_frames()`.
    sample_index: usize,
    /// Set once the first write lands.
    primed: bool,
}

impl AudioRingBuffer {
    /// `capacity_bytes` must be a whole number of frames.
    pub fn new(capacity_bytes: usize, bytes_per_frame: usize) -> Self {
        assert!(bytes_per_frame > 0, "bytes_per_frame must be > 0");
        assert!(
            capacity_bytes >= bytes_per_frame && capacity_bytes % bytes_per_frame == 0,
            "capacity must be a positive whole number of frames"
        );
        AudioRingBuffer {
            capacity_bytes,
            bytes_per_frame,
            sample_index: 0,
            primed: false,
        }
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn capacity_frames(&self) -> usize {
        self.capacity_bytes / self.bytes_per_frame
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_frame
    }

    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    /// Byte offset of the next slot the producer will fill.
    pub fn producer_offset(&self) -> usize {
        self.sample_index * self.bytes_per_frame
    }

    /// The range to write this frame given the device's current play cursor.
    pub fn writable_range(&self, play_cursor: usize, latency_samples: usize) -> WriteRange {
        compute_write_range(
            play_cursor,
            latency_samples,
            self.producer_offset(),
            self.capacity_bytes,
            self.bytes_per_frame,
            !self.primed,
        )
    }

    /// Locks `[starting_byte, starting_byte + byte_count)` on the device, fills it with
    /// the tone, and commits it. `starting_byte` must be the producer offset.
    ///
    /// The tone and the producer cursor only advance once the device accepts the
    /// unlock. A refused lock leaves both untouched and the ring bytes unchanged; the
    /// next frame recomputes its range from the then-current play cursor.
    pub fn write_to_device<D: SoundDevice + ?Sized>(
        &mut self,
        device: &mut D,
        starting_byte: usize,
        byte_count: usize,
        tone: &mut ToneState,
        volume: f32,
    ) -> Result<WriteReport> {
        if byte_count == 0
            || byte_count > self.capacity_bytes
            || starting_byte >= self.capacity_bytes
            || starting_byte != self.producer_offset()
        {
            return Err(DeviceError::InvalidRange {
                start: starting_byte,
                count: byte_count,
                capacity: self.capacity_bytes,
            });
        }

        let period = tone.period();
        let start = tone.phase_sample_counter();

        let locked = device.lock(starting_byte, byte_count)?;
        let (first, second) = locked.regions();
        let first_frames = tone::fill_frames(first, start, period, volume);
        let second_frames = tone::fill_frames(second, start + first_frames as u64, period, volume);
        let receipt = locked.finish();
        device.unlock(receipt)?;

        let frames = first_frames + second_frames;
        self.sample_index = (self.sample_index + frames) % self.capacity_frames();
        self.primed = true;
        tone.advance(frames as u64);

        Ok(WriteReport {
            first: receipt.first,
            second: receipt.second,
            frames,
        })
    }
}
