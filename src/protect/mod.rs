//! Protection semantics — zone classification and regulatory dose.
//!
//! [`ZonePolicy`] decides how aggressively to suppress each block;
//! [`DoseAccumulator`] tracks how much hazardous energy the wearer has
//! already absorbed this session.  Both consume the per-block
//! [`crate::audio::AcousticReading`] and nothing else.

pub mod dose;
pub mod zone;

pub use dose::{DoseAccumulator, ExposureState};
pub use zone::{ProtectionZone, ZoneDecision, ZonePolicy};
