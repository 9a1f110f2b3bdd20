//! Geodetic -> local tangent-plane transform
//!
//! Uses the equirectangular (flat-earth) approximation around the origin:
//! longitude deltas are scaled by cos(origin latitude) and both deltas are
//! converted to meters with the mean Earth radius. Error stays well below GPS
//! noise for the few-kilometer ranges an AR overlay covers, and the result is
//! smooth in both inputs.

use crate::error::{NavError, NavResult};
use crate::types::{
    enu_to_world, position_from_transform, world_to_enu, EnuVec, GeoPoint, WorldTransform,
    WorldVec,
};
use geo::HaversineDistance;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Position of a target relative to the origin
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offset3D {
    /// East, North, Up in meters
    pub enu: EnuVec,
    /// Rigid transform placing the rendered object in the AR world frame
    pub transform: WorldTransform,
}

impl Offset3D {
    pub fn zero() -> Self {
        Offset3D {
            enu: EnuVec::zeros(),
            transform: WorldTransform::identity(),
        }
    }

    pub fn east(&self) -> f64 {
        self.enu.x
    }

    pub fn north(&self) -> f64 {
        self.enu.y
    }

    pub fn up(&self) -> f64 {
        self.enu.z
    }

    pub fn magnitude(&self) -> f64 {
        self.enu.norm()
    }

    /// Where the rendered object sits in the AR world frame
    pub fn position(&self) -> WorldVec {
        position_from_transform(&self.transform)
    }
}

/// Origin-relative transform with an optional yaw correction
///
/// The AR session is expected to run gravity-and-heading aligned, so the
/// default is translation only.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoTransform {
    heading_correction: Option<Rotation3<f64>>,
}

impl GeoTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate placed objects about the vertical axis, clockwise seen from above
    pub fn with_heading_correction_deg(degrees: f64) -> Self {
        GeoTransform {
            heading_correction: Some(Rotation3::from_axis_angle(
                &Vector3::y_axis(),
                -degrees.to_radians(),
            )),
        }
    }

    pub fn from_heading_correction(degrees: Option<f64>) -> Self {
        match degrees {
            Some(deg) => Self::with_heading_correction_deg(deg),
            None => Self::new(),
        }
    }

    /// Offset of `target` relative to `origin`
    pub fn offset(&self, origin: &GeoPoint, target: &GeoPoint) -> Offset3D {
        let enu = enu_offset(origin, target);
        let mut world = enu_to_world(&enu);
        if let Some(rotation) = self.heading_correction {
            world = rotation * world;
        }
        Offset3D {
            enu,
            transform: WorldTransform::new_translation(&world),
        }
    }

    /// Recover the coordinate an offset was computed for
    ///
    /// Fails if the offset reaches past a pole (latitude out of range).
    pub fn inverse(&self, origin: &GeoPoint, offset: &Offset3D) -> NavResult<GeoPoint> {
        let mut world = offset.position();
        if let Some(rotation) = self.heading_correction {
            world = rotation.inverse() * world;
        }
        geo_point_from_enu(origin, &world_to_enu(&world))
    }

    pub fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        distance(a, b)
    }
}

/// ENU displacement of `target` from `origin` (equirectangular)
pub fn enu_offset(origin: &GeoPoint, target: &GeoPoint) -> EnuVec {
    let d_lat = (target.latitude() - origin.latitude()).to_radians();
    let d_lon = wrap_longitude_delta(target.longitude() - origin.longitude()).to_radians();
    let east = MEAN_EARTH_RADIUS_M * d_lon * origin.latitude().to_radians().cos();
    let north = MEAN_EARTH_RADIUS_M * d_lat;
    let up = match (origin.altitude(), target.altitude()) {
        (Some(from), Some(to)) => to - from,
        _ => 0.0,
    };
    EnuVec::new(east, north, up)
}

/// Inverse of `enu_offset`
pub fn geo_point_from_enu(origin: &GeoPoint, enu: &EnuVec) -> NavResult<GeoPoint> {
    let cos_lat = origin.latitude().to_radians().cos();
    let d_lat = (enu.y / MEAN_EARTH_RADIUS_M).to_degrees();
    let d_lon = (enu.x / (MEAN_EARTH_RADIUS_M * cos_lat)).to_degrees();
    if !d_lat.is_finite() || !d_lon.is_finite() {
        return Err(NavError::NonFiniteCoordinate);
    }

    let point = GeoPoint::new(
        origin.latitude() + d_lat,
        normalize_longitude(origin.longitude() + d_lon),
    )?;
    match origin.altitude() {
        Some(alt) => point.with_altitude(alt + enu.z),
        None => Ok(point),
    }
}

/// Great-circle distance in meters
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    a.to_geo().haversine_distance(&b.to_geo())
}

/// Shortest signed longitude difference, in [-180, 180]
pub(crate) fn wrap_longitude_delta(delta_deg: f64) -> f64 {
    if delta_deg > 180.0 {
        delta_deg - 360.0
    } else if delta_deg < -180.0 {
        delta_deg + 360.0
    } else {
        delta_deg
    }
}

/// Wrap longitude into [-180, 180]
pub(crate) fn normalize_longitude(lon_deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon_deg) {
        lon_deg
    } else {
        (lon_deg + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).expect("valid point")
    }

    #[test]
    fn test_identity_is_zero() {
        let transform = GeoTransform::new();
        for p in [point(40.73, -73.997), point(-33.9, 151.2), point(0.0, 0.0)] {
            let offset = transform.offset(&p, &p);
            assert_eq!(offset.enu, EnuVec::zeros());
            assert_eq!(offset.position(), WorldVec::zeros());
        }
    }

    #[test]
    fn test_one_thousandth_degree_east_in_manhattan() {
        let origin = point(40.730, -73.997);
        let target = point(40.730, -73.996);
        let offset = GeoTransform::new().offset(&origin, &target);

        assert!(offset.east() > 0.0);
        assert_abs_diff_eq!(offset.north(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(offset.magnitude(), 84.3, epsilon = 0.5);
    }

    #[test]
    fn test_ar_world_axes() {
        let origin = point(10.0, 10.0);
        let north = point(10.001, 10.0);
        let offset = GeoTransform::new().offset(&origin, &north);
        let pos = offset.position();
        // North is -z in the AR world frame
        assert!(pos.z < 0.0);
        assert_abs_diff_eq!(pos.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pos.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_altitude_maps_to_up() {
        let origin = point(10.0, 10.0).with_altitude(5.0).expect("valid");
        let target = point(10.0, 10.0).with_altitude(12.5).expect("valid");
        let offset = GeoTransform::new().offset(&origin, &target);
        assert_relative_eq!(offset.up(), 7.5);
        assert_relative_eq!(offset.position().y, 7.5);

        // Missing altitude on either side means flat
        let flat = GeoTransform::new().offset(&origin, &point(10.0, 10.0));
        assert_eq!(flat.up(), 0.0);
    }

    #[test]
    fn test_magnitude_strictly_increases_with_distance() {
        let origin = point(51.5, -0.12);
        let transform = GeoTransform::new();
        for bearing_deg in (0..360).step_by(15) {
            let (s, c) = (bearing_deg as f64).to_radians().sin_cos();
            let mut previous = 0.0;
            for step in 1..=20 {
                let r = step as f64 * 1e-4;
                let target = point(51.5 + r * c, -0.12 + r * s);
                let magnitude = transform.offset(&origin, &target).magnitude();
                assert!(magnitude > previous, "bearing {} step {}", bearing_deg, step);
                previous = magnitude;
            }
        }
    }

    #[test]
    fn test_small_input_change_small_output_change() {
        let transform = GeoTransform::new();
        let origin = point(40.73, -73.997);
        let target = point(40.735, -73.99);
        let nudged = point(40.735 + 1e-7, -73.99 + 1e-7);
        let a = transform.offset(&origin, &target);
        let b = transform.offset(&origin, &nudged);
        assert!((a.enu - b.enu).norm() < 0.05);
    }

    #[test]
    fn test_inverse_recovers_target() {
        let transform = GeoTransform::with_heading_correction_deg(12.0);
        let origin = point(40.730, -73.997).with_altitude(10.0).expect("valid");
        let target = point(40.7342, -73.9871).with_altitude(14.0).expect("valid");
        let offset = transform.offset(&origin, &target);
        let recovered = transform.inverse(&origin, &offset).expect("in range");
        assert_abs_diff_eq!(recovered.latitude(), target.latitude(), epsilon = 1e-9);
        assert_abs_diff_eq!(recovered.longitude(), target.longitude(), epsilon = 1e-9);
        assert_abs_diff_eq!(recovered.altitude().unwrap_or_default(), 14.0, epsilon = 1e-9);
    }

    #[test]
    fn test_heading_correction_rotates_clockwise() {
        let transform = GeoTransform::with_heading_correction_deg(90.0);
        let origin = point(0.0, 0.0);
        let north = point(0.001, 0.0);
        let offset = transform.offset(&origin, &north);
        let pos = offset.position();
        // North rotated a quarter turn clockwise points east (+x)
        assert!(pos.x > 100.0);
        assert_abs_diff_eq!(pos.z, 0.0, epsilon = 1e-6);
        // Rotation does not change distance
        assert_relative_eq!(pos.norm(), offset.magnitude(), epsilon = 1e-9);
    }

    #[test]
    fn test_antimeridian_takes_short_way() {
        let origin = point(0.0, 179.9995);
        let target = point(0.0, -179.9995);
        let offset = GeoTransform::new().offset(&origin, &target);
        assert!(offset.east() > 0.0);
        assert!(offset.east() < 200.0);
    }

    #[test]
    fn test_distance_matches_offset_at_short_range() {
        let a = point(40.730, -73.997);
        let b = point(40.7315, -73.9952);
        let d = distance(&a, &b);
        let m = GeoTransform::new().offset(&a, &b).magnitude();
        assert_relative_eq!(d, m, max_relative = 1e-3);
    }

    #[test]
    fn test_normalize_longitude() {
        assert_relative_eq!(normalize_longitude(181.0), -179.0);
        assert_relative_eq!(normalize_longitude(-181.0), 179.0);
        assert_relative_eq!(normalize_longitude(45.0), 45.0);
    }
}
