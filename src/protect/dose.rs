//! Regulatory exposure-dose accumulation.
//!
//! [`DoseAccumulator`] integrates time-weighted acoustic energy into a
//! cumulative percentage of the permissible daily exposure, OSHA-style:
//! an 8-hour criterion at 85 dB with a 5 dB exchange rate, so every 5 dB
//! above the criterion halves the permissible time and doubles the accrual
//! rate.  Accrual is gated at 80 dB — a guard margin below the legal
//! criterion so borderline noise is not double-counted.
//!
//! Elapsed time per block is derived from block length and sample rate
//! (`AudioConfig::block_secs`), never from wall-clock deltas, so scheduler
//! jitter cannot skew the dose.
//!
//! The dose is monotone non-decreasing within a session and has **no upper
//! clamp** — readings past 100 % are the overexposure signal.  The only way
//! down is the explicit session reset.

use std::time::Instant;

// ---------------------------------------------------------------------------
// ExposureState
// ---------------------------------------------------------------------------

/// Session-long exposure record — the only pipeline state that survives
/// across blocks.  Mutated once per block by [`DoseAccumulator::accumulate`].
#[derive(Debug, Clone)]
pub struct ExposureState {
    /// Cumulative dose as a percentage of the permissible daily exposure.
    /// May exceed 100.
    pub cumulative_dose_pct: f64,
    /// When the dose last changed.  Session bookkeeping only — accrual math
    /// never reads this.
    pub updated_at: Instant,
}

impl ExposureState {
    /// Fresh session: zero dose.
    pub fn new() -> Self {
        Self {
            cumulative_dose_pct: 0.0,
            updated_at: Instant::now(),
        }
    }

    /// Session-start action: clear the accumulated dose.
    pub fn reset(&mut self) {
        self.cumulative_dose_pct = 0.0;
        self.updated_at = Instant::now();
    }
}

impl Default for ExposureState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// DoseAccumulator
// ---------------------------------------------------------------------------

/// OSHA-style time-weighted dose integrator.
///
/// # Example
///
/// ```rust
/// use sitesync::protect::{DoseAccumulator, ExposureState};
///
/// let accumulator = DoseAccumulator::default();
/// let mut state = ExposureState::new();
///
/// // 90 dB for one 0.128 s block: (0.128/28800) * 2^((90-85)/5) * 100
/// let inc = accumulator.accumulate(&mut state, 90.0, 0.128);
/// assert!((inc - 0.128 / 28_800.0 * 2.0 * 100.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct DoseAccumulator {
    /// Criterion level: 100 % dose after `reference_secs` at this SPL (dB).
    criterion_db: f64,
    /// Exchange rate: dB increase that halves the permissible time.
    exchange_db: f64,
    /// Accrual gate (dB); blocks at or below this contribute nothing.
    gate_db: f64,
    /// Permissible duration at the criterion level, in seconds.
    reference_secs: f64,
}

impl DoseAccumulator {
    /// OSHA defaults: 85 dB criterion, 5 dB exchange, 80 dB gate, 8 h day.
    pub fn new() -> Self {
        Self {
            criterion_db: 85.0,
            exchange_db: 5.0,
            gate_db: 80.0,
            reference_secs: 8.0 * 3_600.0,
        }
    }

    /// Accumulate one block's exposure into `state` and return the
    /// increment (in percentage points; `0.0` when gated).
    ///
    /// `elapsed_secs` must be the block duration derived from sample count,
    /// not a wall-clock delta.
    pub fn accumulate(&self, state: &mut ExposureState, spl_db: f32, elapsed_secs: f64) -> f64 {
        let spl = f64::from(spl_db);
        if spl <= self.gate_db || elapsed_secs <= 0.0 {
            return 0.0;
        }

        let rate = 2.0_f64.powf((spl - self.criterion_db) / self.exchange_db);
        let increment = (elapsed_secs / self.reference_secs) * rate * 100.0;

        state.cumulative_dose_pct += increment;
        state.updated_at = Instant::now();
        increment
    }
}

impl Default for DoseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
