//! Audio subsystem — device transport, level estimation, and output safety.
//!
//! # Layout
//!
//! ```text
//! Microphone → AudioCapture (cpal, block assembly)
//!           → [pipeline, see crate::pipeline]
//!           → PeakLimiter → PlaybackQueue → AudioPlayback (cpal)
//! ```
//!
//! [`LevelEstimator`] and [`PeakLimiter`] are pure per-block computations;
//! [`AudioCapture`] and [`AudioPlayback`] are the thin cpal wrappers at the
//! device boundary.

pub mod buffer;
pub mod capture;
pub mod level;
pub mod limiter;
pub mod playback;

pub use buffer::RingBuffer;
pub use capture::{AudioCapture, CaptureError, StreamHandle};
pub use level::{AcousticReading, LevelEstimator, SILENCE_FLOOR};
pub use limiter::{peak, PeakLimiter};
pub use playback::{new_playback_queue, AudioPlayback, PlaybackError, PlaybackQueue};
