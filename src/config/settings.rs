//! Headset settings structs, defaults, validation and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! [`HeadsetConfig::validate`] runs before the audio loop starts; an invalid
//! configuration is fatal at startup, never discovered mid-block.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Reason a configuration failed validation.  All variants are startup-fatal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sample_rate must be positive (got {0})")]
    BadSampleRate(u32),

    #[error("block_size must be positive (got {0})")]
    BadBlockSize(usize),

    #[error("speech_threshold must be in (0, 1] (got {0})")]
    BadSpeechThreshold(f32),

    #[error("zone thresholds must satisfy 0 < moderate_db < critical_db (got {moderate_db}/{critical_db})")]
    BadZoneThresholds { moderate_db: f32, critical_db: f32 },

    #[error("suppression intensity {name} must be in [0, 1] (got {value})")]
    BadIntensity { name: &'static str, value: f32 },

    #[error("max_ear_output must be in (0, 1] (got {0})")]
    BadOutputCeiling(f32),

    #[error("relay host must not be empty")]
    EmptyRelayHost,
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Capture/playback transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz for both capture and playback.
    pub sample_rate: u32,
    /// Samples per pipeline block.  With the default 16 kHz / 2048 this is
    /// a 128 ms block period — the budget one pipeline pass must fit in.
    pub block_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            block_size: 2_048,
        }
    }
}

impl AudioConfig {
    /// Wall-time duration of one block in seconds, derived from block length
    /// and sample rate (never from clock drift).
    pub fn block_secs(&self) -> f64 {
        self.block_size as f64 / self.sample_rate as f64
    }
}

// ---------------------------------------------------------------------------
// LevelConfig
// ---------------------------------------------------------------------------

/// Level-estimation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Acoustic calibration in dB: offset from digital RMS to SPL at the
    /// microphone capsule for this headset model.
    pub calibration_offset_db: f32,
    /// RMS amplitude above which the wearer counts as speaking.
    pub speech_threshold: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            calibration_offset_db: 98.0,
            speech_threshold: 0.015,
        }
    }
}

// ---------------------------------------------------------------------------
// ZoneConfig
// ---------------------------------------------------------------------------

/// Protection-zone thresholds and per-zone suppression intensities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// SPL at which the cautionary band begins (dB).
    pub moderate_db: f32,
    /// SPL at which the legal hazard threshold is met (dB).
    pub critical_db: f32,
    /// Target intensity at or above `critical_db`.
    pub critical_intensity: f32,
    /// Target intensity in `[moderate_db, critical_db)`.
    pub moderate_intensity: f32,
    /// Target intensity below `moderate_db` while the wearer is speaking.
    pub transparency_speech_intensity: f32,
    /// Target intensity below `moderate_db` while the wearer is quiet.
    pub transparency_idle_intensity: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            moderate_db: 70.0,
            critical_db: 85.0,
            critical_intensity: 0.98,
            moderate_intensity: 0.65,
            transparency_speech_intensity: 0.05,
            transparency_idle_intensity: 0.15,
        }
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Output-safety settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Hard ceiling on the absolute sample value reaching the ear.
    pub max_ear_output: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_ear_output: 0.25,
        }
    }
}

// ---------------------------------------------------------------------------
// RelayConfig
// ---------------------------------------------------------------------------

/// Speech relay (comms uplink) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Receiver host for speech datagrams.
    pub host: String,
    /// Receiver UDP port.
    pub port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5_005,
        }
    }
}

// ---------------------------------------------------------------------------
// HeadsetConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level headset configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use sitesync::config::HeadsetConfig;
///
/// // Load (returns Default when file is missing)
/// let config = HeadsetConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeadsetConfig {
    /// Capture/playback transport settings.
    pub audio: AudioConfig,
    /// Level-estimation settings.
    pub level: LevelConfig,
    /// Protection-zone thresholds and intensities.
    pub zones: ZoneConfig,
    /// Output-safety settings.
    pub output: OutputConfig,
    /// Speech relay settings.
    pub relay: RelayConfig,
}

impl HeadsetConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(HeadsetConfig::default())` when the file does not exist
    /// yet (first-run scenario) so callers never need to special-case a
    /// missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject configurations the pipeline cannot run safely with.
    ///
    /// Checked once at startup, before any device or socket is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audio.sample_rate == 0 {
            return Err(ConfigError::BadSampleRate(self.audio.sample_rate));
        }
        if self.audio.block_size == 0 {
            return Err(ConfigError::BadBlockSize(self.audio.block_size));
        }
        if !(self.level.speech_threshold > 0.0 && self.level.speech_threshold <= 1.0) {
            return Err(ConfigError::BadSpeechThreshold(self.level.speech_threshold));
        }
        if !(self.zones.moderate_db > 0.0 && self.zones.moderate_db < self.zones.critical_db) {
            return Err(ConfigError::BadZoneThresholds {
                moderate_db: self.zones.moderate_db,
                critical_db: self.zones.critical_db,
            });
        }

        for (name, value) in [
            ("critical", self.zones.critical_intensity),
            ("moderate", self.zones.moderate_intensity),
            (
                "transparency_speech",
                self.zones.transparency_speech_intensity,
            ),
            ("transparency_idle", self.zones.transparency_idle_intensity),
        ] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(ConfigError::BadIntensity { name, value });
            }
        }

        if !(self.output.max_ear_output > 0.0 && self.output.max_ear_output <= 1.0) {
            return Err(ConfigError::BadOutputCeiling(self.output.max_ear_output));
        }
        if self.relay.host.trim().is_empty() {
            return Err(ConfigError::EmptyRelayHost);
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `HeadsetConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = HeadsetConfig::default();
        original.save_to(&path).expect("save");

        let loaded = HeadsetConfig::load_from(&path).expect("load");

        assert_eq!(original.audio.sample_rate, loaded.audio.sample_rate);
        assert_eq!(original.audio.block_size, loaded.audio.block_size);
        assert_eq!(
            original.level.calibration_offset_db,
            loaded.level.calibration_offset_db
        );
        assert_eq!(original.level.speech_threshold, loaded.level.speech_threshold);
        assert_eq!(original.zones.moderate_db, loaded.zones.moderate_db);
        assert_eq!(original.zones.critical_db, loaded.zones.critical_db);
        assert_eq!(
            original.zones.critical_intensity,
            loaded.zones.critical_intensity
        );
        assert_eq!(original.output.max_ear_output, loaded.output.max_ear_output);
        assert_eq!(original.relay.host, loaded.relay.host);
        assert_eq!(original.relay.port, loaded.relay.port);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = HeadsetConfig::load_from(&path).expect("should not error");
        let default = HeadsetConfig::default();

        assert_eq!(config.audio.sample_rate, default.audio.sample_rate);
        assert_eq!(config.zones.critical_db, default.zones.critical_db);
        assert_eq!(config.relay.port, default.relay.port);
    }

    /// Verify default values match the headset's shipping calibration.
    #[test]
    fn default_values() {
        let cfg = HeadsetConfig::default();

        assert_eq!(cfg.audio.sample_rate, 16_000);
        assert_eq!(cfg.audio.block_size, 2_048);
        assert_eq!(cfg.level.calibration_offset_db, 98.0);
        assert_eq!(cfg.level.speech_threshold, 0.015);
        assert_eq!(cfg.zones.moderate_db, 70.0);
        assert_eq!(cfg.zones.critical_db, 85.0);
        assert_eq!(cfg.zones.critical_intensity, 0.98);
        assert_eq!(cfg.zones.moderate_intensity, 0.65);
        assert_eq!(cfg.zones.transparency_speech_intensity, 0.05);
        assert_eq!(cfg.zones.transparency_idle_intensity, 0.15);
        assert_eq!(cfg.output.max_ear_output, 0.25);
        assert_eq!(cfg.relay.host, "127.0.0.1");
        assert_eq!(cfg.relay.port, 5_005);

        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn block_secs_derives_from_block_and_rate() {
        let cfg = AudioConfig::default();
        assert!((cfg.block_secs() - 0.128).abs() < 1e-9);
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = HeadsetConfig::default();
        cfg.audio.sample_rate = 48_000;
        cfg.audio.block_size = 1_024;
        cfg.level.calibration_offset_db = 94.0;
        cfg.zones.critical_db = 88.0;
        cfg.output.max_ear_output = 0.2;
        cfg.relay.host = "10.0.0.7".into();
        cfg.relay.port = 6_000;

        cfg.save_to(&path).expect("save");
        let loaded = HeadsetConfig::load_from(&path).expect("load");

        assert_eq!(loaded.audio.sample_rate, 48_000);
        assert_eq!(loaded.audio.block_size, 1_024);
        assert_eq!(loaded.level.calibration_offset_db, 94.0);
        assert_eq!(loaded.zones.critical_db, 88.0);
        assert_eq!(loaded.output.max_ear_output, 0.2);
        assert_eq!(loaded.relay.host, "10.0.0.7");
        assert_eq!(loaded.relay.port, 6_000);
    }

    // --- validation rejections ---

    #[test]
    fn zero_sample_rate_is_rejected() {
        let mut cfg = HeadsetConfig::default();
        cfg.audio.sample_rate = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::BadSampleRate(0)));
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let mut cfg = HeadsetConfig::default();
        cfg.audio.block_size = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::BadBlockSize(0)));
    }

    #[test]
    fn inverted_zone_thresholds_are_rejected() {
        let mut cfg = HeadsetConfig::default();
        cfg.zones.moderate_db = 90.0; // above critical_db (85)
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::BadZoneThresholds { .. })
        ));
    }

    #[test]
    fn out_of_range_intensity_is_rejected() {
        let mut cfg = HeadsetConfig::default();
        cfg.zones.moderate_intensity = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::BadIntensity {
                name: "moderate",
                ..
            })
        ));
    }

    #[test]
    fn non_positive_ceiling_is_rejected() {
        let mut cfg = HeadsetConfig::default();
        cfg.output.max_ear_output = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::BadOutputCeiling(_))
        ));
    }

    #[test]
    fn bad_speech_threshold_is_rejected() {
        let mut cfg = HeadsetConfig::default();
        cfg.level.speech_threshold = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::BadSpeechThreshold(_))
        ));
    }

    #[test]
    fn empty_relay_host_is_rejected() {
        let mut cfg = HeadsetConfig::default();
        cfg.relay.host = "  ".into();
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyRelayHost));
    }
}
