//! Noise suppression — the pluggable engine behind the safety pipeline.
//!
//! The pipeline consumes suppression strictly through the [`Suppressor`]
//! trait; [`SpectralGateSuppressor`] is the engine the headset ships with.
//! Swapping in a spectral-subtraction or ML denoiser is a one-line change
//! in `main.rs`.

pub mod engine;
pub mod spectral;

pub use engine::{SuppressError, SuppressionResult, Suppressor};
pub use spectral::SpectralGateSuppressor;

#[cfg(test)]
pub use engine::MockSuppressor;
