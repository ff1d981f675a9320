//! Output peak limiter — the hard ceiling before the wearer's ear.
//!
//! [`PeakLimiter`] clamps a block's peak amplitude to the configured ceiling
//! by scaling the **whole block** linearly (`ceiling / peak`).  Scaling the
//! entire block preserves the waveform shape; clipping individual samples
//! would add harmonic distortion on top of an already painful transient.
//!
//! This stage runs unconditionally on every block, with no bypass.  It is
//! the last line of defense against both suppression-engine misbehaviour
//! and loud transients, so it must work even on the raw pass-through path.

/// Hard limiter with a fixed linear-amplitude ceiling.
///
/// # Example
///
/// ```rust
/// use sitesync::audio::PeakLimiter;
///
/// let limiter = PeakLimiter::new(0.25);
/// let mut block = vec![0.4, -0.4, 0.2];
/// limiter.apply(&mut block);
///
/// // Peak 0.4 → ceiling 0.25, every sample scaled by 0.625.
/// assert_eq!(block, vec![0.25, -0.25, 0.125]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PeakLimiter {
    /// Maximum allowed absolute sample value at the ear.
    ceiling: f32,
}

impl PeakLimiter {
    /// Create a limiter with the given ceiling (default 0.25 comes from
    /// configuration).
    pub fn new(ceiling: f32) -> Self {
        Self { ceiling }
    }

    /// Configured ceiling.
    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// Limit `block` in place and return its post-limit peak amplitude.
    ///
    /// Blocks already at or under the ceiling pass through untouched, so
    /// re-limiting a limited block is a no-op.
    pub fn apply(&self, block: &mut [f32]) -> f32 {
        let peak = peak(block);
        if peak <= self.ceiling {
            return peak;
        }

        let gain = self.ceiling / peak;
        for sample in block.iter_mut() {
            *sample *= gain;
        }
        self.ceiling
    }
}

/// Largest absolute sample value in `block` (0.0 for an empty block).
pub fn peak(block: &[f32]) -> f32 {
    block.iter().fold(0.0_f32, |acc, &s| acc.max(s.abs()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenario: peak 0.4 against a 0.25 ceiling scales everything by 0.625.
    #[test]
    fn over_ceiling_scales_whole_block() {
        let limiter = PeakLimiter::new(0.25);
        let mut block = vec![0.4, -0.4, 0.2, 0.1];
        let out_peak = limiter.apply(&mut block);

        assert!((out_peak - 0.25).abs() < 1e-7);
        assert!((block[0] - 0.25).abs() < 1e-7);
        assert!((block[1] + 0.25).abs() < 1e-7);
        assert!((block[2] - 0.125).abs() < 1e-7); // 0.2 * 0.625
        assert!((block[3] - 0.0625).abs() < 1e-7); // 0.1 * 0.625
    }

    #[test]
    fn under_ceiling_passes_untouched() {
        let limiter = PeakLimiter::new(0.25);
        let original = vec![0.1, -0.2, 0.05];
        let mut block = original.clone();
        let out_peak = limiter.apply(&mut block);

        assert_eq!(block, original);
        assert!((out_peak - 0.2).abs() < 1e-7);
    }

    #[test]
    fn exactly_at_ceiling_passes_untouched() {
        let limiter = PeakLimiter::new(0.25);
        let mut block = vec![0.25, -0.25];
        limiter.apply(&mut block);
        assert_eq!(block, vec![0.25, -0.25]);
    }

    #[test]
    fn limiting_is_idempotent() {
        let limiter = PeakLimiter::new(0.25);
        let mut block = vec![0.9, -0.7, 0.5, -0.3];
        limiter.apply(&mut block);
        let once = block.clone();
        limiter.apply(&mut block);
        assert_eq!(block, once);
    }

    #[test]
    fn output_peak_never_exceeds_ceiling() {
        let limiter = PeakLimiter::new(0.25);
        for raw_peak in [0.26_f32, 0.5, 1.0, 4.0, 100.0] {
            let mut block = vec![raw_peak, -raw_peak / 2.0, raw_peak / 3.0];
            limiter.apply(&mut block);
            assert!(
                peak(&block) <= 0.25 + 1e-6,
                "peak {raw_peak} escaped the ceiling: {:?}",
                block
            );
        }
    }

    #[test]
    fn silent_block_is_a_no_op() {
        let limiter = PeakLimiter::new(0.25);
        let mut block = vec![0.0; 8];
        assert_eq!(limiter.apply(&mut block), 0.0);
        assert_eq!(block, vec![0.0; 8]);
    }

    #[test]
    fn peak_of_empty_block_is_zero() {
        assert_eq!(peak(&[]), 0.0);
    }
}
