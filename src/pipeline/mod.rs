//! Real-time safety pipeline — orchestration, routing, and telemetry.
//!
//! # Architecture
//!
//! ```text
//! cpal input callback (audio thread)
//!        │  fixed-size block
//!        ▼
//! PipelineOrchestrator::process_block()
//!        ├─ LevelEstimator → AcousticReading
//!        ├─ DoseAccumulator → ExposureState (session-long)
//!        ├─ ZonePolicy → ZoneDecision
//!        ├─ Suppressor (fallback: raw block on engine failure)
//!        ├─ PeakLimiter (unconditional)
//!        ├─ OutputRouter ─▶ PlaybackQueue ─▶ cpal output callback
//!        │              └▶ RelayLink (iff speech, fire-and-forget)
//!        └─ TelemetryTap ─▶ try_send ─▶ console renderer thread
//! ```
//!
//! The orchestrator never blocks and never panics on bad input; see
//! [`runner`] for the per-block recovery rules.

pub mod router;
pub mod runner;
pub mod state;

pub use router::OutputRouter;
pub use runner::PipelineOrchestrator;
pub use state::{telemetry_channel, BlockStage, TelemetrySnapshot, TelemetryTap};
