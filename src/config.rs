//! Tunables for the navigation engine
//!
//! Loaded from JSON (every field optional, defaults below) and overridable
//! from the command line.

use crate::error::{NavError, NavResult};
use crate::route::RouteInterpolator;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fixes with a horizontal accuracy radius above this are never used
pub const DEFAULT_ACCURACY_THRESHOLD_M: f64 = 65.0;

/// Target distance between interpolated waypoints
pub const DEFAULT_INTERPOLATION_SPACING_M: f64 = 10.0;

/// Smallest accepted spacing. Keeps the waypoint count of any leg on Earth
/// within a few hundred million.
pub const MIN_INTERPOLATION_SPACING_M: f64 = 0.1;

/// Marker scale is `constant / distance` by default
pub const DEFAULT_SCALE_CONSTANT: f64 = 100.0;

/// Distance floor for inverse-distance scaling (avoids a pole at 0 m)
pub const DEFAULT_SCALE_MIN_DISTANCE_M: f64 = 1.0;

/// Duration the renderer animates a refresh batch over
pub const DEFAULT_REFRESH_ANIMATION_SECS: f64 = 0.5;

/// Distance -> display scale mapping
///
/// Both variants are monotonically non-increasing in distance, so markers
/// farther from the origin never render larger than nearer ones.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScaleMapping {
    /// `constant / max(distance, min_distance_m)`
    InverseDistance { constant: f64, min_distance_m: f64 },
    /// `near_scale * 0.5^(distance / half_distance_m)`
    Exponential { near_scale: f64, half_distance_m: f64 },
}

impl Default for ScaleMapping {
    fn default() -> Self {
        ScaleMapping::InverseDistance {
            constant: DEFAULT_SCALE_CONSTANT,
            min_distance_m: DEFAULT_SCALE_MIN_DISTANCE_M,
        }
    }
}

impl ScaleMapping {
    pub fn scale_for(&self, distance_m: f64) -> f64 {
        let distance_m = distance_m.max(0.0);
        match *self {
            ScaleMapping::InverseDistance {
                constant,
                min_distance_m,
            } => constant / distance_m.max(min_distance_m),
            ScaleMapping::Exponential {
                near_scale,
                half_distance_m,
            } => near_scale * 0.5_f64.powf(distance_m / half_distance_m),
        }
    }

    fn validate(&self) -> NavResult<()> {
        let (a, b, what) = match *self {
            ScaleMapping::InverseDistance {
                constant,
                min_distance_m,
            } => (constant, min_distance_m, "inverse_distance"),
            ScaleMapping::Exponential {
                near_scale,
                half_distance_m,
            } => (near_scale, half_distance_m, "exponential"),
        };
        if !(a.is_finite() && a > 0.0 && b.is_finite() && b > 0.0) {
            return Err(NavError::InvalidConfig(format!(
                "{} scale parameters must be finite and positive",
                what
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub accuracy_threshold_m: f64,
    pub interpolation_spacing_m: f64,
    pub scale: ScaleMapping,
    pub refresh_animation_secs: f64,
    /// Extra yaw (degrees, clockwise from north) applied to the local frame
    /// when the AR session's heading alignment is known to be off
    pub heading_correction_deg: Option<f64>,
}

impl Default for NavConfig {
    fn default() -> Self {
        NavConfig {
            accuracy_threshold_m: DEFAULT_ACCURACY_THRESHOLD_M,
            interpolation_spacing_m: DEFAULT_INTERPOLATION_SPACING_M,
            scale: ScaleMapping::default(),
            refresh_animation_secs: DEFAULT_REFRESH_ANIMATION_SECS,
            heading_correction_deg: None,
        }
    }
}

impl NavConfig {
    pub fn from_json_str(json: &str) -> NavResult<Self> {
        let config: NavConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> NavResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> NavResult<()> {
        if !(self.accuracy_threshold_m.is_finite() && self.accuracy_threshold_m >= 0.0) {
            return Err(NavError::InvalidConfig(format!(
                "accuracy_threshold_m must be finite and non-negative, got {}",
                self.accuracy_threshold_m
            )));
        }
        RouteInterpolator::new(self.interpolation_spacing_m)?;
        if !(self.refresh_animation_secs.is_finite() && self.refresh_animation_secs >= 0.0) {
            return Err(NavError::InvalidConfig(format!(
                "refresh_animation_secs must be finite and non-negative, got {}",
                self.refresh_animation_secs
            )));
        }
        if let Some(deg) = self.heading_correction_deg {
            if !deg.is_finite() {
                return Err(NavError::InvalidConfig(
                    "heading_correction_deg must be finite".to_string(),
                ));
            }
        }
        self.scale.validate()
    }
}
