//! Configuration management for Reelsmith.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//! - Resolution of external tool locations
//!
//! # Example
//!
//! ```no_run
//! use reel_core::config::{ConfigManager, ConfigSection, ToolPaths};
//!
//! let mut config = ConfigManager::new("reelsmith.toml");
//! config.load_or_create().unwrap();
//!
//! let tools = ToolPaths::resolve(&config.settings().tools);
//! println!("ffmpeg: {}", tools.ffmpeg.display());
//!
//! config.settings_mut().composition.music_volume = 0.2;
//! config.update_section(ConfigSection::Composition).unwrap();
//! ```

mod manager;
mod settings;
mod tools;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    CompositionSettings, ConfigSection, EncodingSettings, LoggingSettings, Settings,
    SubtitleSettings, ToolSettings,
};
pub use tools::ToolPaths;
