//! Configuration module for the SiteSync headset.
//!
//! Provides `HeadsetConfig` (top-level settings), sub-configs for each
//! subsystem, `AppPaths` for cross-platform data directories, TOML
//! persistence via `HeadsetConfig::load` / `HeadsetConfig::save`, and the
//! startup-fatal `validate()` pass.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AudioConfig, ConfigError, HeadsetConfig, LevelConfig, OutputConfig, RelayConfig, ZoneConfig,
};
