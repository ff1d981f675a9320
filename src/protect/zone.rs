//! Protection-zone classification.
//!
//! [`ZonePolicy::classify`] maps one block's `(spl_db, is_speech)` pair to a
//! [`ProtectionZone`] and a target suppression intensity.  The mapping is a
//! stateless pure function — every block is classified independently, with
//! no hysteresis, so sustained borderline noise can oscillate between zones
//! from block to block.  That matches the deployed behaviour; smoothing is
//! deliberately not applied here.
//!
//! | Condition                     | Zone               | Intensity |
//! |-------------------------------|--------------------|-----------|
//! | `spl >= critical_db` (85)     | CriticalProtection | 0.98      |
//! | `moderate_db (70) <= spl < 85`| ActiveReduction    | 0.65      |
//! | below, wearer speaking        | Transparency       | 0.05      |
//! | below, wearer quiet           | Transparency       | 0.15      |

use crate::audio::AcousticReading;
use crate::config::ZoneConfig;

// ---------------------------------------------------------------------------
// ProtectionZone
// ---------------------------------------------------------------------------

/// Discrete protection state of the headset for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionZone {
    /// Low-noise regime: minimal attenuation, situational awareness and
    /// speech pass through.
    Transparency,
    /// Cautionary band: moderate attenuation.
    ActiveReduction,
    /// Legal hazard threshold met or exceeded: near-total suppression.
    CriticalProtection,
}

impl ProtectionZone {
    /// Operator-facing label, as shown on the telemetry dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            ProtectionZone::Transparency => "TRANSPARENCY MODE",
            ProtectionZone::ActiveReduction => "ACTIVE REDUCTION",
            ProtectionZone::CriticalProtection => "CRITICAL PROTECTION",
        }
    }
}

// ---------------------------------------------------------------------------
// ZoneDecision / ZonePolicy
// ---------------------------------------------------------------------------

/// One block's classification: the zone plus the suppression intensity the
/// engine should target.  Derived purely from the current reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneDecision {
    pub zone: ProtectionZone,
    /// Target suppression intensity in `[0, 1]`.
    pub intensity: f32,
}

/// Config-driven classifier.  Thresholds and intensities come from
/// [`ZoneConfig`]; defaults are 70/85 dB and 0.98/0.65/0.05/0.15.
#[derive(Debug, Clone)]
pub struct ZonePolicy {
    zones: ZoneConfig,
}

impl ZonePolicy {
    pub fn new(zones: ZoneConfig) -> Self {
        Self { zones }
    }

    /// Classify one reading.  Total over all inputs; both dB boundaries are
    /// inclusive of the louder zone.
    pub fn classify(&self, reading: &AcousticReading) -> ZoneDecision {
        let z = &self.zones;
        if reading.spl_db >= z.critical_db {
            ZoneDecision {
                zone: ProtectionZone::CriticalProtection,
                intensity: z.critical_intensity,
            }
        } else if reading.spl_db >= z.moderate_db {
            ZoneDecision {
                zone: ProtectionZone::ActiveReduction,
                intensity: z.moderate_intensity,
            }
        } else if reading.is_speech {
            ZoneDecision {
                zone: ProtectionZone::Transparency,
                intensity: z.transparency_speech_intensity,
            }
        } else {
            ZoneDecision {
                zone: ProtectionZone::Transparency,
                intensity: z.transparency_idle_intensity,
            }
        }
    }
}

impl Default for ZonePolicy {
    fn default() -> Self {
        Self::new(ZoneConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
