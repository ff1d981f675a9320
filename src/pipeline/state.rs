//! Per-block stage machine and telemetry hand-off.
//!
//! [`BlockStage`] names the stations one block passes through; the
//! orchestrator advances it as the block moves down the chain, so a failure
//! can always say exactly how far processing got.  The machine is terminal
//! per pass — nothing about it survives into the next block.
//!
//! [`TelemetrySnapshot`] is the read-only projection handed to the
//! presentation layer after each pass, and [`TelemetryTap`] is the
//! **non-blocking** hand-off: a bounded channel written with `try_send`.
//! If the renderer has not consumed the previous frame, the new one is
//! dropped and counted — the audio thread never waits on the terminal.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

use crate::protect::ProtectionZone;

// ---------------------------------------------------------------------------
// BlockStage
// ---------------------------------------------------------------------------

/// Stations of one pipeline pass, in processing order.
///
/// ```text
/// Captured → Estimated → Classified → Suppressed → Limited → Routed → Rendered
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlockStage {
    /// Raw block received from the capture transport.
    Captured,
    /// RMS / SPL / speech flag computed, dose accumulated.
    Estimated,
    /// Protection zone and target intensity decided.
    Classified,
    /// Suppression engine has produced (or pass-through replaced) output.
    Suppressed,
    /// Peak ceiling enforced.
    Limited,
    /// Block handed to playback and (while speaking) the relay.
    Routed,
    /// Telemetry snapshot published; the pass is complete.
    Rendered,
}

impl BlockStage {
    /// Short label for logs and diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            BlockStage::Captured => "captured",
            BlockStage::Estimated => "estimated",
            BlockStage::Classified => "classified",
            BlockStage::Suppressed => "suppressed",
            BlockStage::Limited => "limited",
            BlockStage::Routed => "routed",
            BlockStage::Rendered => "rendered",
        }
    }
}

// ---------------------------------------------------------------------------
// TelemetrySnapshot
// ---------------------------------------------------------------------------

/// Read-only per-block projection for the presentation layer.  Rebuilt every
/// block; holds no identity of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    /// Calibrated sound-pressure level of the raw block (dB).
    pub spl_db: f32,
    /// Raw-block RMS amplitude.
    pub rms: f32,
    /// Protection zone this block was classified into.
    pub zone: ProtectionZone,
    /// Suppression intensity requested from the engine, `[0, 1]`.
    pub suppression_intensity: f32,
    /// Cumulative exposure dose (% of permissible daily exposure).
    pub dose_pct: f64,
    /// Whether the wearer was speaking during this block.
    pub is_speech: bool,
    /// Peak amplitude of the block delivered to the ear (post-limiter).
    pub output_peak: f32,
    /// Relay datagrams lost since startup (send failures, counted silently).
    pub dropped_sends: u64,
    /// Telemetry frames dropped since startup because the renderer was busy.
    pub dropped_renders: u64,
}

// ---------------------------------------------------------------------------
// TelemetryTap
// ---------------------------------------------------------------------------

/// Producer half of the telemetry hand-off, owned by the orchestrator.
pub struct TelemetryTap {
    tx: SyncSender<TelemetrySnapshot>,
    dropped: u64,
}

/// Build the bounded hand-off pair.  Capacity 1: the renderer only ever
/// needs the freshest frame, and anything deeper would just add display lag.
pub fn telemetry_channel() -> (TelemetryTap, Receiver<TelemetrySnapshot>) {
    let (tx, rx) = sync_channel(1);
    (TelemetryTap { tx, dropped: 0 }, rx)
}

impl TelemetryTap {
    /// Publish one frame without blocking.  A busy or departed renderer
    /// costs this frame only; the drop is counted into subsequent frames.
    pub fn publish(&mut self, mut snapshot: TelemetrySnapshot) {
        snapshot.dropped_renders = self.dropped;
        match self.tx.try_send(snapshot) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
            }
        }
    }

    /// Frames dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
