//! Core suppression-engine trait.
//!
//! [`Suppressor`] is the capability boundary between the safety pipeline and
//! whatever noise-suppression algorithm the headset ships with.  The
//! pipeline only relies on the contract, never the algorithm:
//!
//! - output length equals input length,
//! - output energy is non-increasing relative to input for intensity > 0,
//! - processing completes well within one block period.
//!
//! [`super::SpectralGateSuppressor`] is the production implementation.
//! `MockSuppressor` (available under `#[cfg(test)]`) lets pipeline tests
//! script arbitrary engine behaviour, including contract violations.

use thiserror::Error;

// ---------------------------------------------------------------------------
// SuppressError
// ---------------------------------------------------------------------------

/// Errors a suppression engine may raise.  All of them are transient from
/// the pipeline's point of view: the orchestrator falls back to limited
/// pass-through for the failing block and keeps running.
#[derive(Debug, Clone, Error)]
pub enum SuppressError {
    /// The requested intensity is not a finite number.
    #[error("suppression intensity must be finite, got {0}")]
    BadIntensity(f32),

    /// The underlying algorithm failed on this block.
    #[error("suppression engine failure: {0}")]
    Engine(String),
}

// ---------------------------------------------------------------------------
// SuppressionResult
// ---------------------------------------------------------------------------

/// One block's suppression output, consumed immediately by the limiter.
#[derive(Debug, Clone)]
pub struct SuppressionResult {
    /// Attenuated samples; must be the same length as the input block.
    pub samples: Vec<f32>,
    /// Fraction of block energy actually removed, in `[0, 1]`.  May differ
    /// from the requested target when the block carries little stationary
    /// energy to remove.
    pub achieved_intensity: f32,
}

// ---------------------------------------------------------------------------
// Suppressor trait
// ---------------------------------------------------------------------------

/// Object-safe interface for noise-suppression engines.
///
/// Implementations must be `Send` so the engine can live inside the cpal
/// callback closure.  `&mut self` allows stateful algorithms (noise-floor
/// trackers, spectral histories) without interior mutability.
///
/// # Contract
///
/// - `intensity` is a target in `[0, 1]`; `0` means pass-through.
/// - `Ok(result)` implies `result.samples.len() == block.len()` and output
///   energy no greater than input energy.
pub trait Suppressor: Send {
    /// Attenuate `block` toward the target `intensity`.
    fn process(&mut self, block: &[f32], intensity: f32) -> Result<SuppressionResult, SuppressError>;
}

// Compile-time assertion: Box<dyn Suppressor> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Suppressor>) {}
};

// ---------------------------------------------------------------------------
// MockSuppressor  (test-only)
// ---------------------------------------------------------------------------

/// A test double with scripted behaviour, including contract violations the
/// orchestrator must survive.
#[cfg(test)]
pub enum MockSuppressor {
    /// Multiply every sample by a fixed gain.
    Gain(f32),
    /// Always fail.
    Fail,
    /// Violate the length contract by returning one sample fewer.
    ShortOutput,
}

#[cfg(test)]
impl Suppressor for MockSuppressor {
    fn process(
        &mut self,
        block: &[f32],
        intensity: f32,
    ) -> Result<SuppressionResult, SuppressError> {
        match self {
            MockSuppressor::Gain(g) => Ok(SuppressionResult {
                samples: block.iter().map(|s| s * *g).collect(),
                achieved_intensity: intensity,
            }),
            MockSuppressor::Fail => Err(SuppressError::Engine("scripted failure".into())),
            MockSuppressor::ShortOutput => Ok(SuppressionResult {
                samples: block[..block.len().saturating_sub(1)].to_vec(),
                achieved_intensity: intensity,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
