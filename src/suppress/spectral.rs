//! Default suppression engine — time-domain stationary-noise gate.
//!
//! [`SpectralGateSuppressor`] tracks the stationary noise floor with an
//! asymmetric envelope follower (quick to fall, slow to rise, so speech
//! bursts do not inflate the floor) and applies a soft per-sample gate:
//! samples near the floor are attenuated toward `1 - intensity`, while
//! samples well above it — transients and speech — keep close to unity
//! gain.  Per-sample gain never exceeds 1.0, so output energy is always
//! non-increasing, as the pipeline contract requires.
//!
//! This is deliberately a modest algorithm: the [`Suppressor`] seam exists
//! precisely so a spectral or ML engine can replace it without touching the
//! pipeline.

use super::engine::{SuppressError, SuppressionResult, Suppressor};
use crate::audio::level::rms;

/// Floor-follower coefficient when the block is quieter than the current
/// floor estimate (fast downward adaptation).
const FLOOR_FALL: f32 = 0.5;
/// Floor-follower coefficient when the block is louder (slow upward
/// adaptation, so transients do not drag the floor up).
const FLOOR_RISE: f32 = 0.05;
/// Samples below `floor * GATE_RATIO` are treated as stationary noise.
const GATE_RATIO: f32 = 2.0;
/// Width of the soft knee above the gate threshold, as a multiple of it.
const KNEE_RATIO: f32 = 3.0;

/// Stationary-noise gate with a tracked floor and a soft knee.
pub struct SpectralGateSuppressor {
    /// Current noise-floor estimate (RMS amplitude).
    noise_floor: f32,
}

impl SpectralGateSuppressor {
    pub fn new() -> Self {
        Self { noise_floor: 0.0 }
    }

    /// Current noise-floor estimate (RMS amplitude).
    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }

    fn update_floor(&mut self, block_rms: f32) {
        let alpha = if block_rms < self.noise_floor {
            FLOOR_FALL
        } else {
            FLOOR_RISE
        };
        self.noise_floor += alpha * (block_rms - self.noise_floor);
    }
}

impl Default for SpectralGateSuppressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Suppressor for SpectralGateSuppressor {
    fn process(
        &mut self,
        block: &[f32],
        intensity: f32,
    ) -> Result<SuppressionResult, SuppressError> {
        if !intensity.is_finite() {
            return Err(SuppressError::BadIntensity(intensity));
        }
        let intensity = intensity.clamp(0.0, 1.0);

        let in_rms = rms(block);
        self.update_floor(in_rms);

        let residual = 1.0 - intensity;
        let gate = self.noise_floor * GATE_RATIO;
        let knee = gate * KNEE_RATIO;

        let samples: Vec<f32> = if intensity == 0.0 || gate <= 0.0 {
            // Nothing to gate against: a cold-started floor or a zero
            // target means the block passes through unchanged.
            block.to_vec()
        } else {
            block
                .iter()
                .map(|&s| {
                    let mag = s.abs();
                    let gain = if mag <= gate {
                        residual
                    } else {
                        // Soft knee: ramp from the residual back to unity
                        // across `knee` so transitions stay inaudible.
                        let t = ((mag - gate) / knee).min(1.0);
                        residual + (1.0 - residual) * t
                    };
                    s * gain
                })
                .collect()
        };

        let out_rms = rms(&samples);
        let achieved_intensity = if in_rms > 0.0 {
            (1.0 - out_rms / in_rms).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(SuppressionResult {
            samples,
            achieved_intensity,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
