//! Store configuration: scale stepping, endpoints and the product name

use serde::{Deserialize, Serialize};
use viewer_core::ConfigError;

pub const DEFAULT_SCALE_STEP: f64 = 0.25;
pub const DEFAULT_MIN_SCALE: f64 = 0.5;
pub const DEFAULT_MAX_SCALE: f64 = 3.0;
pub const DEFAULT_PRODUCT_ENDPOINT: &str = "public/produtos";
pub const DEFAULT_SIGNATURE_API: &str = "/flowbee/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Added or removed by `increase_scale` / `decrease_scale`
    pub scale_step: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Multipart upload endpoint; uploads are refused without one
    pub file_api: Option<String>,
    pub product_endpoint: String,
    pub product_name: Option<String>,
    /// Base path of the signature API; `/public` is appended for token access
    pub signature_api: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scale_step: DEFAULT_SCALE_STEP,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            file_api: None,
            product_endpoint: DEFAULT_PRODUCT_ENDPOINT.to_string(),
            product_name: None,
            signature_api: DEFAULT_SIGNATURE_API.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale_step > 0.0) {
            return Err(ConfigError::Invalid {
                field: "scale_step",
                reason: format!("must be positive, got {}", self.scale_step),
            });
        }
        if !(self.min_scale > 0.0) || self.min_scale > self.max_scale {
            return Err(ConfigError::Invalid {
                field: "min_scale",
                reason: format!(
                    "must be positive and not above max_scale ({} > {})",
                    self.min_scale, self.max_scale
                ),
            });
        }
        Ok(())
    }
}
