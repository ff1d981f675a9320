//! Pipeline orchestrator — drives one full pass per captured block.
//!
//! [`PipelineOrchestrator::process_block`] owns the per-block sequencing:
//!
//! ```text
//! Captured → Estimated → Classified → Suppressed → Limited → Routed → Rendered
//! ```
//!
//! It runs inside the cpal input callback, so its one hard rule is that a
//! bad block must never take the loop down.  Failure handling is graded:
//!
//! - non-finite samples are scrubbed to silence before estimation;
//! - a misbehaving suppression engine (error or length-contract violation)
//!   is replaced by the raw block for this pass — unsuppressed but still
//!   peak-limited, so the wearer keeps hearing protected audio;
//! - the limiter and router run unconditionally; only an empty block skips
//!   the pass entirely.
//!
//! The only state that survives between passes is [`ExposureState`] (and
//! the suppression engine's own internals behind its trait).

use crate::audio::{LevelEstimator, PeakLimiter};
use crate::config::HeadsetConfig;
use crate::protect::{DoseAccumulator, ExposureState, ZonePolicy};
use crate::suppress::Suppressor;

use super::router::OutputRouter;
use super::state::{BlockStage, TelemetrySnapshot, TelemetryTap};

/// Owns the per-block pipeline and all its stages.
///
/// Constructed once in `main`, then moved into the capture callback closure
/// and driven by the audio transport for the life of the session.
pub struct PipelineOrchestrator {
    estimator: LevelEstimator,
    dose: DoseAccumulator,
    exposure: ExposureState,
    policy: ZonePolicy,
    suppressor: Box<dyn Suppressor>,
    limiter: PeakLimiter,
    router: OutputRouter,
    telemetry: TelemetryTap,
    /// Block duration in seconds, fixed at startup from block size and
    /// sample rate.
    block_secs: f64,
    /// Reused scratch for scrubbing non-finite input without allocating
    /// on the audio thread.
    scrub_buf: Vec<f32>,
    /// How far the most recent pass got.
    stage: BlockStage,
    scrubbed_blocks: u64,
    fallback_blocks: u64,
}

impl PipelineOrchestrator {
    pub fn new(
        config: &HeadsetConfig,
        suppressor: Box<dyn Suppressor>,
        router: OutputRouter,
        telemetry: TelemetryTap,
    ) -> Self {
        Self {
            estimator: LevelEstimator::new(
                config.level.calibration_offset_db,
                config.level.speech_threshold,
            ),
            dose: DoseAccumulator::new(),
            exposure: ExposureState::new(),
            policy: ZonePolicy::new(config.zones.clone()),
            suppressor,
            limiter: PeakLimiter::new(config.output.max_ear_output),
            router,
            telemetry,
            block_secs: config.audio.block_secs(),
            scrub_buf: Vec::with_capacity(config.audio.block_size),
            stage: BlockStage::Captured,
            scrubbed_blocks: 0,
            fallback_blocks: 0,
        }
    }

    /// Run one complete pass and return the published telemetry frame.
    ///
    /// Returns `None` only for an empty block, which carries nothing to
    /// protect or play.
    pub fn process_block(&mut self, block: &[f32]) -> Option<TelemetrySnapshot> {
        if block.is_empty() {
            return None;
        }
        self.stage = BlockStage::Captured;

        // ── Scrub: the estimator assumes finite input ────────────────────
        let block: &[f32] = if block.iter().all(|s| s.is_finite()) {
            block
        } else {
            self.scrubbed_blocks += 1;
            log::debug!(
                "scrubbed non-finite samples from block ({} so far)",
                self.scrubbed_blocks
            );
            self.scrub_buf.clear();
            self.scrub_buf
                .extend(block.iter().map(|&s| if s.is_finite() { s } else { 0.0 }));
            &self.scrub_buf
        };

        // ── Estimate + dose ──────────────────────────────────────────────
        let reading = self.estimator.analyze(block);
        self.dose
            .accumulate(&mut self.exposure, reading.spl_db, self.block_secs);
        self.stage = BlockStage::Estimated;

        // ── Classify ─────────────────────────────────────────────────────
        let decision = self.policy.classify(&reading);
        self.stage = BlockStage::Classified;

        // ── Suppress, degrading to pass-through on any engine misbehaviour
        let mut samples = match self.suppressor.process(block, decision.intensity) {
            Ok(result) if result.samples.len() == block.len() => result.samples,
            Ok(result) => {
                self.fallback_blocks += 1;
                log::debug!(
                    "suppressor broke the length contract ({} for {}), passing block through",
                    result.samples.len(),
                    block.len()
                );
                block.to_vec()
            }
            Err(e) => {
                self.fallback_blocks += 1;
                log::debug!("suppressor failed ({e}), passing block through");
                block.to_vec()
            }
        };
        self.stage = BlockStage::Suppressed;

        // ── Limit: unconditional, also on the pass-through path ──────────
        let output_peak = self.limiter.apply(&mut samples);
        self.stage = BlockStage::Limited;

        // ── Route ────────────────────────────────────────────────────────
        self.router.route(&samples, reading.is_speech);
        self.stage = BlockStage::Routed;

        // ── Render hand-off (non-blocking) ───────────────────────────────
        let snapshot = TelemetrySnapshot {
            spl_db: reading.spl_db,
            rms: reading.rms,
            zone: decision.zone,
            suppression_intensity: decision.intensity,
            dose_pct: self.exposure.cumulative_dose_pct,
            is_speech: reading.is_speech,
            output_peak,
            dropped_sends: self.router.dropped_sends(),
            dropped_renders: self.telemetry.dropped(),
        };
        self.telemetry.publish(snapshot.clone());
        self.stage = BlockStage::Rendered;

        Some(snapshot)
    }

    /// Session-start action: clear the accumulated exposure dose.
    pub fn reset_exposure(&mut self) {
        self.exposure.reset();
    }

    /// Current session exposure record.
    pub fn exposure(&self) -> &ExposureState {
        &self.exposure
    }

    /// How far the most recent pass got.
    pub fn stage(&self) -> BlockStage {
        self.stage
    }

    /// Blocks that needed the pass-through fallback so far.
    pub fn fallback_blocks(&self) -> u64 {
        self.fallback_blocks
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{new_playback_queue, peak, PlaybackQueue};
    use crate::pipeline::state::{telemetry_channel, TelemetrySnapshot};
    use crate::protect::ProtectionZone;
    use crate::relay::{RelayError, RelayLink};
    use crate::suppress::MockSuppressor;
    use std::sync::mpsc::Receiver;
    use std::sync::{Arc, Mutex};

    struct CountingRelay {
        sent: Arc<Mutex<u64>>,
    }

    impl RelayLink for CountingRelay {
        fn send_block(&mut self, _samples: &[f32]) -> Result<(), RelayError> {
            *self.sent.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct Harness {
        orchestrator: PipelineOrchestrator,
        queue: PlaybackQueue,
        relayed: Arc<Mutex<u64>>,
        frames: Receiver<TelemetrySnapshot>,
    }

    fn harness(suppressor: MockSuppressor) -> Harness {
        let config = HeadsetConfig::default();
        let queue = new_playback_queue(16_000);
        let relayed = Arc::new(Mutex::new(0));
        let router = OutputRouter::new(
            Arc::clone(&queue),
            Some(Box::new(CountingRelay {
                sent: Arc::clone(&relayed),
            })),
        );
        let (tap, frames) = telemetry_channel();
        Harness {
            orchestrator: PipelineOrchestrator::new(&config, Box::new(suppressor), router, tap),
            queue,
            relayed,
            frames,
        }
    }

    fn drain_queue(queue: &PlaybackQueue, len: usize) -> Vec<f32> {
        let mut out = vec![0.0; len];
        queue.lock().unwrap().pop_into(&mut out);
        out
    }

    // --- happy path ---

    /// A moderately loud speech block: cautionary zone, relayed, played.
    #[test]
    fn moderate_speech_block_full_pass() {
        let mut h = harness(MockSuppressor::Gain(1.0));

        let snapshot = h.orchestrator.process_block(&[0.05; 2_048]).unwrap();

        assert!((snapshot.spl_db - 71.98).abs() < 0.1);
        assert_eq!(snapshot.zone, ProtectionZone::ActiveReduction);
        assert_eq!(snapshot.suppression_intensity, 0.65);
        assert!(snapshot.is_speech);
        assert_eq!(h.orchestrator.stage(), BlockStage::Rendered);

        assert_eq!(*h.relayed.lock().unwrap(), 1);
        assert_eq!(h.queue.lock().unwrap().len(), 2_048);
        assert!(h.frames.try_recv().is_ok());
    }

    #[test]
    fn quiet_block_is_played_but_not_relayed() {
        let mut h = harness(MockSuppressor::Gain(1.0));

        let snapshot = h.orchestrator.process_block(&[0.001; 2_048]).unwrap();

        assert!(!snapshot.is_speech);
        assert_eq!(*h.relayed.lock().unwrap(), 0);
        assert_eq!(h.queue.lock().unwrap().len(), 2_048);
    }

    /// A hazard-level block is classified critical and limited to the
    /// ceiling before reaching the ear.
    #[test]
    fn loud_block_is_critical_and_limited() {
        let mut h = harness(MockSuppressor::Gain(1.0));

        let snapshot = h.orchestrator.process_block(&[0.5; 2_048]).unwrap();

        assert_eq!(snapshot.zone, ProtectionZone::CriticalProtection);
        assert_eq!(snapshot.suppression_intensity, 0.98);
        assert!((snapshot.output_peak - 0.25).abs() < 1e-6);

        let played = drain_queue(&h.queue, 2_048);
        assert!(peak(&played) <= 0.25 + 1e-6);
    }

    #[test]
    fn dose_accrues_and_resets() {
        let mut h = harness(MockSuppressor::Gain(1.0));

        for _ in 0..10 {
            h.orchestrator.process_block(&[0.5; 2_048]).unwrap();
        }
        let dosed = h.orchestrator.exposure().cumulative_dose_pct;
        assert!(dosed > 0.0);

        h.orchestrator.reset_exposure();
        assert_eq!(h.orchestrator.exposure().cumulative_dose_pct, 0.0);
    }

    #[test]
    fn quiet_blocks_accrue_no_dose() {
        let mut h = harness(MockSuppressor::Gain(1.0));
        for _ in 0..10 {
            h.orchestrator.process_block(&[0.001; 2_048]).unwrap();
        }
        assert_eq!(h.orchestrator.exposure().cumulative_dose_pct, 0.0);
    }

    // --- recovery paths ---

    /// A failing engine must not interrupt audio: the raw block passes
    /// through, still limited, still played and relayed.
    #[test]
    fn suppressor_failure_degrades_to_limited_pass_through() {
        let mut h = harness(MockSuppressor::Fail);

        let snapshot = h.orchestrator.process_block(&[0.5; 2_048]).unwrap();

        assert_eq!(h.orchestrator.fallback_blocks(), 1);
        assert_eq!(h.orchestrator.stage(), BlockStage::Rendered);
        assert!((snapshot.output_peak - 0.25).abs() < 1e-6);
        assert_eq!(h.queue.lock().unwrap().len(), 2_048);
        assert_eq!(*h.relayed.lock().unwrap(), 1);
    }

    #[test]
    fn length_contract_violation_degrades_to_pass_through() {
        let mut h = harness(MockSuppressor::ShortOutput);

        h.orchestrator.process_block(&[0.1; 2_048]).unwrap();

        assert_eq!(h.orchestrator.fallback_blocks(), 1);
        // The played block has the full input length, not the short one.
        assert_eq!(h.queue.lock().unwrap().len(), 2_048);
    }

    #[test]
    fn non_finite_input_is_scrubbed_not_fatal() {
        let mut h = harness(MockSuppressor::Gain(1.0));

        let mut block = vec![0.05_f32; 2_048];
        block[7] = f32::NAN;
        block[100] = f32::INFINITY;

        let snapshot = h.orchestrator.process_block(&block).unwrap();

        assert!(snapshot.spl_db.is_finite());
        let played = drain_queue(&h.queue, 2_048);
        assert!(played.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn empty_block_skips_the_pass() {
        let mut h = harness(MockSuppressor::Gain(1.0));
        assert!(h.orchestrator.process_block(&[]).is_none());
        assert!(h.queue.lock().unwrap().is_empty());
    }

    /// A sequence of good and bad blocks: every one of them reaches the
    /// ear, and the dose never moves backwards.
    #[test]
    fn mixed_block_sequence_keeps_audio_flowing() {
        let mut h = harness(MockSuppressor::Fail);

        let mut last_dose = 0.0;
        for block in [
            vec![0.5_f32; 2_048],
            vec![0.001; 2_048],
            vec![f32::NAN; 2_048],
            vec![0.05; 2_048],
        ] {
            let snapshot = h.orchestrator.process_block(&block).unwrap();
            assert!(snapshot.output_peak <= 0.25 + 1e-6);
            assert!(snapshot.dose_pct >= last_dose);
            last_dose = snapshot.dose_pct;
        }
        assert_eq!(h.queue.lock().unwrap().len(), 4 * 2_048);
    }
}
