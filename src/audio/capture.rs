//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/input-stream lifecycle.  Call
//! [`AudioCapture::start`] with a block handler; the cpal callback downmixes
//! to mono, assembles fixed-size blocks, and invokes the handler once per
//! complete block **on the audio thread** — the handler is the real-time
//! pipeline and must finish within one block period.
//!
//! The returned [`StreamHandle`] is a RAII guard — dropping it stops the
//! underlying cpal stream and releases the device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps a cpal stream alive.
///
/// Dropping this value drops `cpal::Stream`, which stops the underlying
/// hardware stream deterministically.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

impl StreamHandle {
    pub(crate) fn new(stream: cpal::Stream) -> Self {
        Self { _stream: stream }
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or starting audio capture.
/// All of these are fatal at startup — the headset must not run without
/// a working microphone.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Microphone capture device wrapper built on top of `cpal`.
///
/// The stream is opened at the pipeline's configured sample rate with the
/// device's native channel count; multi-channel input is averaged down to
/// mono before block assembly.
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Number of interleaved channels the device delivers.
    channels: u16,
}

impl AudioCapture {
    /// Create an [`AudioCapture`] on the system default input device, opened
    /// at `sample_rate` Hz.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoDevice`] when no input device is available,
    /// or [`CaptureError::DefaultConfig`] when the device cannot report a
    /// default stream configuration.  A device that cannot run at
    /// `sample_rate` surfaces later as [`CaptureError::BuildStream`].
    pub fn new(sample_rate: u32) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;
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

    /// Start capturing and invoke `on_block` once per assembled block.
    ///
    /// Hardware buffers rarely match `block_size`, so samples are staged in
    /// an assembly buffer and `on_block` fires each time `block_size` mono
    /// samples are available.  The handler runs on the cpal audio thread.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the stream configuration.
    pub fn start(
        &self,
        block_size: usize,
        mut on_block: impl FnMut(&[f32]) + Send + 'static,
    ) -> Result<StreamHandle, CaptureError> {
        let channels = self.channels as usize;
        let mut pending: Vec<f32> = Vec::with_capacity(block_size * 2);

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                mix_to_mono(data, channels, &mut pending);

                let mut offset = 0;
                while pending.len() - offset >= block_size {
                    on_block(&pending[offset..offset + block_size]);
                    offset += block_size;
                }
                if offset > 0 {
                    pending.drain(..offset);
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal input stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(StreamHandle::new(stream))
    }

    /// Number of interleaved channels the device delivers.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// Downmix interleaved `data` to mono by averaging each frame, appending the
/// result to `out`.  Mono input is appended as-is.
pub fn mix_to_mono(data: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(data);
        return;
    }
    for frame in data.chunks_exact(channels) {
        out.push(frame.iter().sum::<f32>() / channels as f32);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_input_is_appended_unchanged() {
        let mut out = vec![9.0];
        mix_to_mono(&[0.1, 0.2, 0.3], 1, &mut out);
        assert_eq!(out, vec![9.0, 0.1, 0.2, 0.3]);
    }

    #[test]
    fn stereo_frames_are_averaged() {
        let mut out = Vec::new();
        mix_to_mono(&[0.2, 0.4, -0.6, 0.6], 2, &mut out);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.3).abs() < 1e-7);
        assert!(out[1].abs() < 1e-7);
    }

    #[test]
    fn trailing_partial_frame_is_ignored() {
        let mut out = Vec::new();
        mix_to_mono(&[0.5, 0.5, 0.9], 2, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn capture_error_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<CaptureError>();
    }
}
