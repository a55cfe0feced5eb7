//! Viewer configuration
//!
//! Tunables for zoom policy, responsive fit mode and download naming.
//! Every field has a default, so an empty TOML document is a valid config.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

pub const DEFAULT_ZOOM_FACTOR: f64 = 1.1;
pub const DEFAULT_ZOOM_OUT_FLOOR: f64 = 0.2;
pub const DEFAULT_FILENAME: &str = "download.pdf";
pub const DEFAULT_SMALL_SCREEN_BREAKPOINT_PX: f64 = 600.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Multiplier applied by zoom-in and divided out by zoom-out
    pub zoom_factor: f64,
    /// Zoom-out is refused when the result would drop below this scale
    pub zoom_out_floor: f64,
    /// Export filename used when the transport reports none
    pub default_filename: String,
    /// Viewports narrower than this are treated as small screens
    pub small_screen_breakpoint_px: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            zoom_factor: DEFAULT_ZOOM_FACTOR,
            zoom_out_floor: DEFAULT_ZOOM_OUT_FLOOR,
            default_filename: DEFAULT_FILENAME.to_string(),
            small_screen_breakpoint_px: DEFAULT_SMALL_SCREEN_BREAKPOINT_PX,
        }
    }
}

impl ViewerConfig {
    /// Parse and validate configuration from a TOML string
    ///
    /// # Example
    ///
    /// ```
    /// use viewer_core::ViewerConfig;
    ///
    /// let config = ViewerConfig::from_toml_str("zoom_out_floor = 0.25").unwrap();
    /// assert_eq!(config.zoom_out_floor, 0.25);
    /// assert_eq!(config.default_filename, "download.pdf");
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read viewer config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid viewer config: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.zoom_factor > 1.0) || !self.zoom_factor.is_finite() {
            return Err(ConfigError::Invalid {
                field: "zoom_factor",
                reason: format!("must be a finite value above 1.0, got {}", self.zoom_factor),
            });
        }
        if !(self.zoom_out_floor > 0.0) || !self.zoom_out_floor.is_finite() {
            return Err(ConfigError::Invalid {
                field: "zoom_out_floor",
                reason: format!("must be a finite positive value, got {}", self.zoom_out_floor),
            });
        }
        if self.default_filename.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "default_filename",
                reason: "must not be empty".to_string(),
            });
        }
        if self.small_screen_breakpoint_px < 0.0 {
            return Err(ConfigError::Invalid {
                field: "small_screen_breakpoint_px",
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ViewerConfig::from_toml_str(
            r#"
            zoom_factor = 1.25
            default_filename = "contract.pdf"
            "#,
        )
        .unwrap();
        assert_eq!(config.zoom_factor, 1.25);
        assert_eq!(config.default_filename, "contract.pdf");
        assert_eq!(config.zoom_out_floor, DEFAULT_ZOOM_OUT_FLOOR);
    }

    #[test]
    fn test_rejects_non_growing_factor() {
        let err = ViewerConfig::from_toml_str("zoom_factor = 1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "zoom_factor", .. }));
    }

    #[test]
    fn test_rejects_zero_floor() {
        let err = ViewerConfig::from_toml_str("zoom_out_floor = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "zoom_out_floor", .. }));
    }

    #[test]
    fn test_rejects_blank_filename() {
        let err = ViewerConfig::from_toml_str("default_filename = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "default_filename", .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = ViewerConfig::from_toml_str("zoom_factor = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let result = ViewerConfig::from_file("/nonexistent/viewer.toml");
        assert!(result.is_err());
    }
}
