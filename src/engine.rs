//! The per-frame loop state: game update first, then the audio write.
//!
//! [`AudioOutput`] is the whole audio subsystem in one value (device, producer
//! cursor, tone) owned by the [`Engine`] and updated once per frame.

use crate::config::AudioConfig;
use crate::device::SoundDevice;
use crate::error::{DeviceError, Result};
use crate::event::{DeviceEvent, EventReceiver};
use crate::game::{GameInput, GameState};
use crate::ring::{AudioRingBuffer, WriteReport};
use crate::tone::ToneState;

pub struct AudioOutput<D: SoundDevice> {
    device: D,
    ring: AudioRingBuffer,
    tone: ToneState,
    latency_samples: usize,
    volume: f32,
    events: Option<EventReceiver>,
}

impl<D: SoundDevice> AudioOutput<D> {
    /// Wraps an opened device and starts looping playback of its (silent) ring.
    pub fn new(mut device: D, config: &AudioConfig) -> Result<Self> {
        if device.capacity_bytes() != config.capacity_bytes() {
            return Err(DeviceError::Unavailable(format!(
                "device ring is {} bytes, expected {}",
                device.capacity_bytes(),
                config.capacity_bytes()
            )));
        }
        device.play(true)?;
        Ok(AudioOutput {
            device,
            ring: AudioRingBuffer::new(config.capacity_bytes(), config.bytes_per_frame()),
            tone: ToneState::new(config.samples_per_second, config.initial_note, config.min_note),
            latency_samples: config.latency_samples(),
            volume: config.volume,
            events: None,
        })
    }

    /// Routes notifications from the device's callback thread into this context.
    pub fn with_events(mut self, events: EventReceiver) -> Self {
        self.events = Some(events);
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn ring(&self) -> &AudioRingBuffer {
        &self.ring
    }

    pub fn tone(&self) -> &ToneState {
        &self.tone
    }

    /// Tops the device ring up to `latency` samples past the play cursor with `note`.
    /// Returns `Ok(None)` when the ring is already full up to the target.
    pub fn update(&mut self, note: f32) -> Result<Option<WriteReport>> {
        self.drain_events();
        self.tone.set_note(note);

        let cursor = self.device.play_cursor()?;
        let range = self.ring.writable_range(cursor, self.latency_samples);
        if range.len == 0 {
            return Ok(None);
        }
        self.ring
            .write_to_device(&mut self.device, range.start, range.len, &mut self.tone, self.volume)
            .map(Some)
    }

    fn drain_events(&mut self) {
        let Some(events) = &self.events else {
            return;
        };
        while let Some(event) = events.try_recv() {
            match event {
                DeviceEvent::PlaybackFinished => log::info!("one-shot playback finished"),
            }
        }
    }
}

/// Game state plus the optional audio subsystem. With no audio the loop runs silent.
pub struct Engine<D: SoundDevice> {
    game: GameState,
    audio: Option<AudioOutput<D>>,
    skipped_frames: u64,
}

impl<D: SoundDevice> Engine<D> {
    pub fn new(config: &AudioConfig, audio: Option<AudioOutput<D>>) -> Self {
        Engine {
            game: GameState::new(config),
            audio,
            skipped_frames: 0,
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn audio(&self) -> Option<&AudioOutput<D>> {
        self.audio.as_ref()
    }

    /// Frames whose audio write was skipped because the device refused it.
    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    /// Runs one frame: update, then audio. A failed audio write is logged and skipped;
    /// the next frame recomputes from the fresh play cursor.
    /// Returns `false` once the game wants to stop.
    pub fn frame(&mut self, input: &GameInput, dt: f32) -> bool {
        let running = self.game.update(input, dt);

        if let Some(audio) = self.audio.as_mut() {
            match audio.update(self.game.note()) {
                Ok(Some(report)) => log::trace!(
                    "wrote {} frames ({} + {} bytes)",
                    report.frames,
                    report.first.len,
                    report.second.len
                ),
                Ok(None) => log::trace!("ring already full up to target"),
                Err(DeviceError::Busy) => {
                    self.skipped_frames += 1;
                    log::debug!("device busy, skipping this frame's audio write");
                }
                Err(e) => {
                    self.skipped_frames += 1;
                    log::warn!("audio write failed, skipping frame: {}", e);
                }
            }
        }

        running
    }
}
