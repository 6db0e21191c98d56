//! Configuration types for the engine and demo applications
//!
//! All settings are serializable so applications can load them from a TOML
//! file, with sensible defaults when the file (or a field) is absent.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::renderer::ToneOperator;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML (or has the wrong shape)
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Client area width in pixels
    pub width: u32,
    /// Client area height in pixels
    pub height: u32,
    /// Enable vsync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "PBR Demo".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Renderer settings consumed by [`crate::renderer::Renderer`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Display gamma
    pub gamma: f32,
    /// Exposure multiplier applied before tone mapping
    pub exposure: f32,
    /// Tone mapping operator
    pub tone_operator: ToneOperator,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            gamma: 2.2,
            exposure: 1.0,
            tone_operator: ToneOperator::Uncharted,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Load configuration from a TOML file, falling back to defaults
    ///
    /// A missing file is not an error (demos run fine unconfigured); a file
    /// that exists but fails to parse is logged and ignored.
    #[must_use]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no config file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert!((config.renderer.gamma - 2.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [window]
            title = "Test"
            width = 640

            [renderer]
            gamma = 1.8
            tone_operator = "reinhard"
            "#,
        )
        .unwrap();

        assert_eq!(config.window.title, "Test");
        assert_eq!(config.window.width, 640);
        // Unspecified fields keep their defaults
        assert_eq!(config.window.height, 720);
        assert!((config.renderer.gamma - 1.8).abs() < f32::EPSILON);
        assert_eq!(config.renderer.tone_operator, ToneOperator::Reinhard);
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(toml::from_str::<AppConfig>("window = 3").is_err());
    }
}
