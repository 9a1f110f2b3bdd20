use crate::config::MIN_INTERPOLATION_SPACING_M;
use crate::error::{NavError, NavResult, NotReady};
use crate::geo_transform::{distance, normalize_longitude, wrap_longitude_delta};
use crate::types::{GeoPoint, RouteStep};
use serde::{Deserialize, Serialize};

/// Path between two consecutive route points
///
/// `intermediates` holds only the interpolated points; the endpoints are
/// represented by the neighbouring route-step markers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub intermediates: Vec<GeoPoint>,
}

impl Leg {
    /// Full ordered path: from, intermediates..., to
    pub fn path(&self) -> impl Iterator<Item = &GeoPoint> {
        std::iter::once(&self.from)
            .chain(self.intermediates.iter())
            .chain(std::iter::once(&self.to))
    }

    pub fn length_m(&self) -> f64 {
        distance(&self.from, &self.to)
    }
}

/// Number of strict intermediates for a leg of `distance_m`
///
/// `max(0, floor(distance / spacing) - 1)`: a leg shorter than two spacings
/// connects its endpoints directly.
pub fn interpolation_count(distance_m: f64, spacing_m: f64) -> usize {
    let slots = (distance_m / spacing_m).floor();
    if slots.is_finite() && slots >= 1.0 {
        slots as usize - 1
    } else {
        0
    }
}

/// Linear interpolation in latitude/longitude at fraction `t` of the way
/// from `from` to `to`
pub fn lerp(from: &GeoPoint, to: &GeoPoint, t: f64) -> GeoPoint {
    let lat = from.latitude() + t * (to.latitude() - from.latitude());
    let d_lon = wrap_longitude_delta(to.longitude() - from.longitude());
    let lon = normalize_longitude(from.longitude() + t * d_lon);
    let alt = match (from.altitude(), to.altitude()) {
        (Some(a), Some(b)) => Some(a + t * (b - a)),
        _ => None,
    };
    GeoPoint::from_validated(lat, lon, alt)
}

/// Fills sparse route steps with evenly spaced waypoints
#[derive(Clone, Copy, Debug)]
pub struct RouteInterpolator {
    spacing_m: f64,
}

impl RouteInterpolator {
    /// Spacing must be finite and at least `MIN_INTERPOLATION_SPACING_M`
    pub fn new(spacing_m: f64) -> NavResult<Self> {
        if !(spacing_m.is_finite() && spacing_m >= MIN_INTERPOLATION_SPACING_M) {
            return Err(NavError::InvalidSpacing(spacing_m));
        }
        Ok(RouteInterpolator { spacing_m })
    }

    pub fn spacing_m(&self) -> f64 {
        self.spacing_m
    }

    /// Strict intermediates between `from` and `to`, ordered from `from`
    pub fn interpolate_leg(&self, from: &GeoPoint, to: &GeoPoint) -> Vec<GeoPoint> {
        let count = interpolation_count(distance(from, to), self.spacing_m);
        let divisions = (count + 1) as f64;
        (1..=count)
            .map(|i| lerp(from, to, i as f64 / divisions))
            .collect()
    }

    /// One leg per step: start -> step[0], then step[i-1] -> step[i]
    ///
    /// `start` is the origin at the time the route is laid out. Without it
    /// nothing is guessed; the caller gets `NotReady::NoOrigin`.
    pub fn build_legs(
        &self,
        start: Option<&GeoPoint>,
        steps: &[RouteStep],
    ) -> Result<Vec<Leg>, NotReady> {
        let start = start.ok_or(NotReady::NoOrigin)?;

        let endpoints = std::iter::once(start).chain(steps.iter().map(|s| &s.point));
        let legs: Vec<Leg> = endpoints
            .zip(steps.iter().map(|s| &s.point))
            .map(|(from, to)| Leg {
                from: *from,
                to: *to,
                intermediates: self.interpolate_leg(from, to),
            })
            .collect();

        log::debug!(
            "Built {} legs with {} waypoints (spacing {:.1} m)",
            legs.len(),
            legs.iter().map(|l| l.intermediates.len()).sum::<usize>(),
            self.spacing_m
        );
        Ok(legs)
    }
}

/// Concatenate legs into one path without repeating shared endpoints
pub fn dense_route(legs: &[Leg]) -> Vec<GeoPoint> {
    let mut route = Vec::new();
    if let Some(first) = legs.first() {
        route.push(first.from);
    }
    for leg in legs {
        route.extend(leg.intermediates.iter().copied());
        route.push(leg.to);
    }
    route
}
