//! Block level estimation — RMS amplitude → calibrated dB SPL.
//!
//! [`LevelEstimator`] turns one raw audio block into an [`AcousticReading`]:
//! the quadratic-mean amplitude, a calibrated sound-pressure level, and a
//! speech-activity flag.  The SPL value drives both the protection-zone
//! classifier and the exposure-dose accumulator, so its edge cases matter:
//!
//! * RMS below the silence floor (`1e-5`) maps to exactly `0.0` dB — the
//!   digital noise floor of a muted input must never accrue dose.
//! * The calibrated value is clamped at `0.0`; SPL is never negative.
//!
//! The estimator assumes clean finite input; the orchestrator scrubs
//! NaN/Inf samples before calling [`LevelEstimator::analyze`].

// ---------------------------------------------------------------------------
// AcousticReading
// ---------------------------------------------------------------------------

/// Per-block acoustic measurement, consumed by the classifier and the dose
/// accumulator and surfaced in telemetry.  Ephemeral — rebuilt every block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcousticReading {
    /// Quadratic-mean amplitude of the block, in `[0.0, 1.0]` for nominal
    /// input.
    pub rms: f32,
    /// Calibrated sound-pressure level in dB.  Always `>= 0.0`; exactly
    /// `0.0` below the silence floor.
    pub spl_db: f32,
    /// `true` when the block's RMS exceeds the speech threshold.
    pub is_speech: bool,
}

// ---------------------------------------------------------------------------
// LevelEstimator
// ---------------------------------------------------------------------------

/// RMS values below this floor read as 0 dB SPL (muted / digital silence).
pub const SILENCE_FLOOR: f32 = 1e-5;

/// Converts raw audio blocks into [`AcousticReading`]s.
///
/// # Example
///
/// ```rust
/// use sitesync::audio::LevelEstimator;
///
/// let est = LevelEstimator::new(98.0, 0.015);
/// let block = vec![0.05_f32; 2048];
///
/// let reading = est.analyze(&block);
/// assert!((reading.rms - 0.05).abs() < 1e-6);
/// assert!((reading.spl_db - 71.98).abs() < 0.1); // 20*log10(0.05) + 98
/// assert!(reading.is_speech);
/// ```
pub struct LevelEstimator {
    /// Headset acoustic calibration in dB: maps digital full-scale RMS to
    /// the SPL actually hitting the microphone capsule.
    calibration_offset_db: f32,
    /// RMS amplitude above which the wearer counts as speaking.
    speech_threshold: f32,
}

impl LevelEstimator {
    /// Create an estimator with the given calibration offset and speech
    /// threshold (defaults 98.0 dB and 0.015 come from configuration).
    pub fn new(calibration_offset_db: f32, speech_threshold: f32) -> Self {
        Self {
            calibration_offset_db,
            speech_threshold,
        }
    }

    /// Measure one block.
    ///
    /// `block` must be non-empty and finite; empty blocks read as silence.
    pub fn analyze(&self, block: &[f32]) -> AcousticReading {
        let rms = rms(block);
        AcousticReading {
            rms,
            spl_db: self.spl_db(rms),
            is_speech: rms > self.speech_threshold,
        }
    }

    /// Convert an RMS amplitude to calibrated dB SPL.
    ///
    /// `max(0, 20*log10(rms) + calibration)`, with values below
    /// [`SILENCE_FLOOR`] pinned to `0.0`.
    pub fn spl_db(&self, rms: f32) -> f32 {
        if rms < SILENCE_FLOOR {
            return 0.0;
        }
        (20.0 * rms.log10() + self.calibration_offset_db).max(0.0)
    }
}

/// Quadratic-mean amplitude of `block` (0.0 for an empty block).
///
/// Accumulates in `f64` so a 2048-sample block loses no precision.
pub fn rms(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let mean_sq: f64 =
        block.iter().map(|&s| f64::from(s) * f64::from(s)).sum::<f64>() / block.len() as f64;
    mean_sq.sqrt() as f32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn default_estimator() -> LevelEstimator {
        LevelEstimator::new(98.0, 0.015)
    }

    // --- rms ---

    #[test]
    fn rms_of_constant_block_is_the_constant() {
        assert!((rms(&[0.5_f32; 1024]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rms_of_empty_block_is_zero() {
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_is_sign_independent() {
        let pos = rms(&[0.3_f32; 256]);
        let neg = rms(&[-0.3_f32; 256]);
        assert!((pos - neg).abs() < 1e-7);
    }

    // --- SPL conversion ---

    #[test]
    fn below_silence_floor_reads_zero_db() {
        let est = default_estimator();
        assert_eq!(est.spl_db(0.0), 0.0);
        assert_eq!(est.spl_db(5e-7), 0.0);
        assert_eq!(est.spl_db(9.9e-6), 0.0);
    }

    #[test]
    fn spl_is_monotone_above_the_floor() {
        let est = default_estimator();
        let mut last = est.spl_db(SILENCE_FLOOR);
        for step in 1..200 {
            let r = SILENCE_FLOOR + step as f32 * 0.005;
            let spl = est.spl_db(r);
            assert!(
                spl >= last,
                "spl must not decrease: rms {r} gave {spl} after {last}"
            );
            last = spl;
        }
    }

    #[test]
    fn spl_never_negative() {
        // 20*log10(1.1e-5) + 98 ≈ -1.17, clamped to 0.
        let est = default_estimator();
        assert_eq!(est.spl_db(1.1e-5), 0.0);
    }

    /// Scenario: rms = 0.05 with a 98 dB calibration lands in the high 71s.
    #[test]
    fn moderate_rms_maps_to_cautionary_band() {
        let est = default_estimator();
        let spl = est.spl_db(0.05);
        let expected = 20.0 * 0.05_f32.log10() + 98.0;
        assert!((spl - expected).abs() < 1e-4);
        assert!(spl > 70.0 && spl < 85.0);
    }

    // --- analyze ---

    /// Scenario: a near-digital-silence block reads 0 dB and is not speech.
    #[test]
    fn near_silence_block_reads_zero_and_not_speech() {
        let est = default_estimator();
        let reading = est.analyze(&[5e-7_f32; 2048]);
        assert_eq!(reading.spl_db, 0.0);
        assert!(!reading.is_speech);
    }

    #[test]
    fn speech_flag_follows_threshold() {
        let est = default_estimator();
        assert!(!est.analyze(&[0.014_f32; 512]).is_speech);
        assert!(est.analyze(&[0.016_f32; 512]).is_speech);
    }

    #[test]
    fn speech_threshold_is_exclusive() {
        // rms == threshold must not count as speech (strict >).
        let est = default_estimator();
        assert!(!est.analyze(&[0.015_f32; 512]).is_speech);
    }

    #[test]
    fn analyze_reports_rms_and_spl_consistently() {
        let est = default_estimator();
        let reading = est.analyze(&[0.05_f32; 2048]);
        assert!((reading.rms - 0.05).abs() < 1e-6);
        assert!((reading.spl_db - est.spl_db(reading.rms)).abs() < 1e-6);
    }
}
