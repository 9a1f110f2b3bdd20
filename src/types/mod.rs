pub mod linalg;

pub use linalg::*;

use crate::error::{NavError, NavResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// WGS84 coordinate in degrees, optionally with altitude in meters
///
/// Fields are private so every value in circulation has passed range
/// validation. Deserialization goes through the same check.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    altitude: Option<f64>,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    altitude: Option<f64>,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = NavError;

    fn try_from(raw: RawGeoPoint) -> NavResult<Self> {
        let point = GeoPoint::new(raw.latitude, raw.longitude)?;
        match raw.altitude {
            Some(alt) => point.with_altitude(alt),
            None => Ok(point),
        }
    }
}

impl GeoPoint {
    /// Validate and build a coordinate. Out-of-range values are rejected,
    /// never clamped.
    pub fn new(latitude: f64, longitude: f64) -> NavResult<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(NavError::NonFiniteCoordinate);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(NavError::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(NavError::InvalidLongitude(longitude));
        }
        Ok(GeoPoint {
            latitude,
            longitude,
            altitude: None,
        })
    }

    pub fn with_altitude(self, altitude: f64) -> NavResult<Self> {
        if !altitude.is_finite() {
            return Err(NavError::NonFiniteCoordinate);
        }
        Ok(GeoPoint {
            altitude: Some(altitude),
            ..self
        })
    }

    /// Build from values derived from already-validated points
    /// (interpolation, inverse transform with normalized longitude).
    pub(crate) fn from_validated(latitude: f64, longitude: f64, altitude: Option<f64>) -> Self {
        debug_assert!((-90.0..=90.0).contains(&latitude));
        debug_assert!((-180.0..=180.0).contains(&longitude));
        GeoPoint {
            latitude,
            longitude,
            altitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    /// geo crate uses Point(x = lon, y = lat)
    pub fn to_geo(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// GPS fix as delivered by the device location subsystem
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLocationFix")]
pub struct LocationFix {
    pub point: GeoPoint,
    /// Radius of uncertainty in meters (smaller is better)
    pub horizontal_accuracy: f64,
    /// Seconds since session start (or any monotonic epoch)
    pub timestamp: f64,
}

#[derive(Deserialize)]
struct RawLocationFix {
    point: GeoPoint,
    horizontal_accuracy: f64,
    timestamp: f64,
}

impl TryFrom<RawLocationFix> for LocationFix {
    type Error = NavError;

    fn try_from(raw: RawLocationFix) -> NavResult<Self> {
        LocationFix::new(raw.point, raw.horizontal_accuracy, raw.timestamp)
    }
}

impl LocationFix {
    pub fn new(point: GeoPoint, horizontal_accuracy: f64, timestamp: f64) -> NavResult<Self> {
        // Negative accuracy is how location services flag an invalid fix
        if !horizontal_accuracy.is_finite() || horizontal_accuracy < 0.0 {
            return Err(NavError::InvalidAccuracy(horizontal_accuracy));
        }
        if !timestamp.is_finite() {
            return Err(NavError::NonFiniteCoordinate);
        }
        Ok(LocationFix {
            point,
            horizontal_accuracy,
            timestamp,
        })
    }

    /// Convenience constructor validating raw degrees
    pub fn from_degrees(
        latitude: f64,
        longitude: f64,
        horizontal_accuracy: f64,
        timestamp: f64,
    ) -> NavResult<Self> {
        LocationFix::new(GeoPoint::new(latitude, longitude)?, horizontal_accuracy, timestamp)
    }
}

/// One step of a route from the routing subsystem
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub point: GeoPoint,
    pub instruction: String,
}

impl RouteStep {
    pub fn new(point: GeoPoint, instruction: impl Into<String>) -> Self {
        RouteStep {
            point,
            instruction: instruction.into(),
        }
    }
}
