//! SiteSync — adaptive hearing-protection headset runtime.
//!
//! Continuously samples ambient sound, estimates acoustic exposure, and
//! drives an adaptive noise-suppression policy that balances hearing
//! protection against speech intelligibility, with a hard output ceiling
//! as the last line of defense before the wearer's ear.
//!
//! # Per-block pipeline
//!
//! ```text
//! Microphone → cpal callback → block assembly
//!        → LevelEstimator   (RMS → calibrated dB SPL, speech flag)
//!        → DoseAccumulator  (OSHA time-weighted exposure %)
//!        → ZonePolicy       (protection zone → suppression intensity)
//!        → Suppressor       (pluggable noise-suppression engine)
//!        → PeakLimiter      (hard output ceiling, unconditional)
//!        → OutputRouter     (playback always, UDP relay while speaking)
//!        → TelemetryTap     (non-blocking snapshot → console renderer)
//! ```
//!
//! The whole chain runs on the cpal input-callback thread and must finish
//! within one block period; everything that could block (network send,
//! terminal writes) is either fire-and-forget or handed off to a separate
//! consumer thread.

pub mod audio;
pub mod config;
pub mod pipeline;
pub mod protect;
pub mod relay;
pub mod suppress;
pub mod ui;
