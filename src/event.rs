//! DeviceEvent: notifications from the audio callback thread to the frame loop. No
//! heap allocation: all variants are fixed-size so they can sit in the SPSC queue.

use crate::spsc::{self, Consumer, Producer};

/// Something the audio callback wants the frame loop to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A one-shot playback reached the end of the ring.
    PlaybackFinished,
}

/// Held by the audio callback.
pub type EventSender = Producer<DeviceEvent>;
/// Drained by the frame loop.
pub type EventReceiver = Consumer<DeviceEvent>;

/// Creates an event channel: a sender for the audio callback and a receiver for the frame loop.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    spsc::channel(capacity)
}
