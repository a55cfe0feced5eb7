//! Zoom factors, scale bounds and page-fit selection
//!
//! All policy functions are pure: they compute the next `Scale::current`
//! and leave applying it to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ViewerConfig;

/// Symbolic fit mode understood by the rendering engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    PageWidth,
    PageFit,
}

impl FitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FitMode::PageWidth => "page-width",
            FitMode::PageFit => "page-fit",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value pushed into a live engine instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleValue {
    Fit(FitMode),
    Factor(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub current: f64,
    pub default: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            current: 1.0,
            default: 1.0,
            min: None,
            max: None,
        }
    }
}

impl Scale {
    /// Scale state right after a document opens at the engine-reported scale
    pub fn opened(initial: f64) -> Self {
        Self {
            current: initial,
            default: initial,
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn reset(&mut self) {
        self.current = self.default;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalePolicy {
    factor: f64,
    floor: f64,
}

impl Default for ScalePolicy {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

impl ScalePolicy {
    pub fn new(factor: f64, floor: f64) -> Self {
        Self { factor, floor }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.zoom_factor, config.zoom_out_floor)
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// `current * factor`, unless that would exceed `scale.max`
    pub fn zoom_in(&self, scale: &Scale) -> f64 {
        let next = scale.current * self.factor;
        match scale.max {
            Some(max) if next > max => scale.current,
            _ => next,
        }
    }

    /// `current / factor`, unless that would drop below the floor
    ///
    /// The effective floor is the larger of the configured floor and `scale.min`.
    pub fn zoom_out(&self, scale: &Scale) -> f64 {
        let next = scale.current / self.factor;
        let floor = scale.min.map_or(self.floor, |min| min.max(self.floor));
        if next < floor {
            scale.current
        } else {
            next
        }
    }

    pub fn reset_zoom(&self, scale: &Scale) -> f64 {
        scale.default
    }

    /// Small viewports open width-fitted, larger ones show the whole page
    pub fn initial_fit_mode(is_small_screen: bool) -> FitMode {
        if is_small_screen {
            FitMode::PageWidth
        } else {
            FitMode::PageFit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(current: f64) -> Scale {
        Scale {
            current,
            ..Scale::default()
        }
    }

    #[test]
    fn test_zoom_in_multiplies() {
        let policy = ScalePolicy::default();
        assert_eq!(policy.zoom_in(&at(1.0)), 1.1);
    }

    #[test]
    fn test_zoom_out_divides() {
        let policy = ScalePolicy::default();
        assert_eq!(policy.zoom_out(&at(1.0)), 1.0 / 1.1);
    }

    #[test]
    fn test_zoom_out_blocked_at_floor() {
        let policy = ScalePolicy::default();
        assert_eq!(policy.zoom_out(&at(0.2)), 0.2);
    }

    #[test]
    fn test_zoom_out_respects_scale_min() {
        let policy = ScalePolicy::default();
        let scale = at(0.6).with_bounds(Some(0.55), None);
        assert_eq!(policy.zoom_out(&scale), 0.6);
    }

    #[test]
    fn test_zoom_in_respects_scale_max() {
        let policy = ScalePolicy::default();
        let scale = at(3.0).with_bounds(None, Some(3.2));
        assert_eq!(policy.zoom_in(&scale), 3.0);
    }

    #[test]
    fn test_reset_zoom_yields_default() {
        let policy = ScalePolicy::default();
        let scale = Scale {
            current: 3.0,
            default: 1.0,
            ..Scale::default()
        };
        assert_eq!(policy.reset_zoom(&scale), 1.0);
    }

    #[test]
    fn test_initial_fit_mode() {
        assert_eq!(ScalePolicy::initial_fit_mode(true), FitMode::PageWidth);
        assert_eq!(ScalePolicy::initial_fit_mode(false), FitMode::PageFit);
        assert_eq!(FitMode::PageWidth.to_string(), "page-width");
        assert_eq!(FitMode::PageFit.as_str(), "page-fit");
    }

    #[test]
    fn test_fit_mode_serializes_kebab_case() {
        let json = serde_json::to_string(&FitMode::PageWidth).unwrap();
        assert_eq!(json, "\"page-width\"");
    }

    proptest! {
        #[test]
        fn zoom_in_undoes_zoom_out(current in 0.01f64..64.0) {
            let policy = ScalePolicy::default();
            let out = policy.zoom_out(&at(current));
            if out != current {
                let back = policy.zoom_in(&at(out));
                prop_assert!((back - current).abs() <= current * 1e-12);
            } else {
                prop_assert!(current / policy.factor() < policy.floor());
            }
        }

        #[test]
        fn zoom_out_idempotent_at_floor(current in 0.001f64..=0.2, repeats in 1usize..10) {
            let policy = ScalePolicy::default();
            let mut scale = at(current);
            for _ in 0..repeats {
                scale.current = policy.zoom_out(&scale);
            }
            prop_assert_eq!(scale.current, current);
        }

        #[test]
        fn reset_ignores_history(
            default in 0.1f64..5.0,
            steps in proptest::collection::vec(any::<bool>(), 0..20)
        ) {
            let policy = ScalePolicy::default();
            let mut scale = Scale::opened(default);
            for zoom_in in steps {
                scale.current = if zoom_in {
                    policy.zoom_in(&scale)
                } else {
                    policy.zoom_out(&scale)
                };
            }
            prop_assert_eq!(policy.reset_zoom(&scale), default);
        }
    }
}
