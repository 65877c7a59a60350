//! Output device backed by the default cpal host. The stream callback is the
//! consumer: it copies frames from the shared ring at the play cursor, with no
//! allocation and no locks.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};

use crate::config::{AudioConfig, CHANNELS};
use crate::device::{Consumption, LockReceipt, LockedRegions, RingHandle, SharedRing, SoundDevice};
use crate::error::{DeviceError, Result};
use crate::event::{DeviceEvent, EventSender};

/// Interleaved samples rendered per pass. Longer callbacks take several passes.
const SCRATCH_SAMPLES: usize = 8_192;

pub struct CpalDevice {
    handle: RingHandle,
    stream: cpal::Stream,
}

impl CpalDevice {
    /// Opens the default output device as 16-bit-equivalent stereo at the configured
    /// rate. Any failure here means "no audio": the caller keeps running silently.
    pub fn open(config: &AudioConfig, events: EventSender) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| DeviceError::Unavailable("no output device available".into()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

        let stream_config = cpal::StreamConfig {
            channels: CHANNELS as u16,
            sample_rate: cpal::SampleRate(config.samples_per_second),
            buffer_size: cpal::BufferSize::Default,
        };
        let ring = Arc::new(SharedRing::new(config.capacity_bytes()));

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, ring.clone(), events),
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, ring.clone(), events),
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, ring.clone(), events),
            sample_format => {
                return Err(DeviceError::Unavailable(format!(
                    "unsupported sample format '{sample_format}'"
                )))
            }
        }?;

        if let Ok(name) = device.name() {
            log::info!(
                "opened output device '{}' at {} Hz, {} byte ring",
                name,
                config.samples_per_second,
                ring.capacity_bytes()
            );
        }

        Ok(CpalDevice {
            handle: RingHandle::new(ring),
            stream,
        })
    }

    pub fn ring(&self) -> &Arc<SharedRing> {
        self.handle.ring()
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    ring: Arc<SharedRing>,
    events: EventSender,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<i16>,
{
    let mut scratch = vec![0i16; SCRATCH_SAMPLES];
    let data_fn = move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        let mut finished = false;
        for chunk in data.chunks_mut(SCRATCH_SAMPLES) {
            let samples = &mut scratch[..chunk.len()];
            finished |= ring.consume(samples) == Consumption::Finished;
            for (out, &sample) in chunk.iter_mut().zip(samples.iter()) {
                *out = T::from_sample(sample);
            }
        }

        // A full queue just loses the notification.
        if finished {
            let _ = events.try_send(DeviceEvent::PlaybackFinished);
        }
    };
    let err_fn = |err: cpal::StreamError| log::error!("an error occurred on the output stream: {}", err);

    device
        .build_output_stream(config, data_fn, err_fn, None)
        .map_err(|e| DeviceError::Unavailable(e.to_string()))
}

impl SoundDevice for CpalDevice {
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
        self.stream
            .play()
            .map_err(|e| DeviceError::Stream(e.to_string()))
    }
}
