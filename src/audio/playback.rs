//! Local playback via `cpal` — the wearer's side of the headset.
//!
//! [`AudioPlayback`] opens the default output device at the pipeline rate
//! and feeds it from the shared playback queue filled by the router.  The
//! output callback pops whatever is available and zero-fills the rest, so a
//! stalled producer degrades to silence instead of stale or garbage audio.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::buffer::RingBuffer;
use super::capture::StreamHandle;

/// Playback queue shared between the processing thread (producer) and the
/// cpal output callback (consumer).  Critical sections are a single
/// push/pop — never held across I/O.
pub type PlaybackQueue = Arc<Mutex<RingBuffer<f32>>>;

/// Construct a [`PlaybackQueue`] holding up to `capacity` mono samples.
pub fn new_playback_queue(capacity: usize) -> PlaybackQueue {
    Arc::new(Mutex::new(RingBuffer::new(capacity)))
}

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or starting playback.  Fatal at
/// startup — a hearing protector that cannot reach the ear is not running.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioPlayback
// ---------------------------------------------------------------------------

/// Output device wrapper mirroring [`super::AudioCapture`].
///
/// Mono pipeline samples are duplicated across however many channels the
/// device exposes.
pub struct AudioPlayback {
    device: cpal::Device,
    config: cpal::StreamConfig,
    channels: u16,
}

impl AudioPlayback {
    /// Create an [`AudioPlayback`] on the system default output device,
    /// opened at `sample_rate` Hz.
    pub fn new(sample_rate: u32) -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackError::NoDevice)?;

        let supported = device.default_output_config()?;
        let channels = supported.channels();

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok(Self {
            device,
            config,
            channels,
        })
    }

    /// Start playback, draining `queue` on every device callback.
    pub fn start(&self, queue: PlaybackQueue) -> Result<StreamHandle, PlaybackError> {
        let channels = self.channels as usize;
        let mut mono: Vec<f32> = Vec::new();

        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels.max(1);
                mono.resize(frames, 0.0);

                // pop_into zero-fills on underrun, so `mono` is always
                // fully valid after this call.
                if let Ok(mut q) = queue.lock() {
                    q.pop_into(&mut mono);
                } else {
                    mono.fill(0.0);
                }

                for (frame, &sample) in data.chunks_exact_mut(channels).zip(mono.iter()) {
                    frame.fill(sample);
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal output stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle::new(stream))
    }

    /// Number of interleaved channels the device expects.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
