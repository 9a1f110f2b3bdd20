use crate::geo_transform::{distance, enu_offset};
use crate::markers::MarkerKind;
use crate::render::MarkerColor;
use crate::route::{dense_route, Leg};
use crate::types::{GeoPoint, RouteStep};
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::{Deserialize, Serialize};

/// Radius of the accuracy circle drawn under each annotation
pub const ANNOTATION_CIRCLE_RADIUS_M: f64 = 0.2;

/// Step annotations are titled "N <instruction>"
pub const STEP_TITLE_PREFIX: &str = "N ";

/// Annotation in local meters [east, north] with its index
type IndexedAnnotation = GeomWithData<[f64; 2], usize>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapAnnotation {
    pub title: String,
    pub coordinate: GeoPoint,
    pub kind: MarkerKind,
    pub color: MarkerColor,
    pub circle_radius_m: f64,
}

impl MapAnnotation {
    pub fn for_step(step: &RouteStep) -> Self {
        MapAnnotation {
            title: format!("{}{}", STEP_TITLE_PREFIX, step.instruction),
            coordinate: step.point,
            kind: MarkerKind::RouteStep,
            color: MarkerKind::RouteStep.color(),
            circle_radius_m: ANNOTATION_CIRCLE_RADIUS_M,
        }
    }

    pub fn for_waypoint(point: &GeoPoint) -> Self {
        MapAnnotation {
            title: point.to_string(),
            coordinate: *point,
            kind: MarkerKind::Waypoint,
            color: MarkerKind::Waypoint.color(),
            circle_radius_m: ANNOTATION_CIRCLE_RADIUS_M,
        }
    }
}

/// Read-only 2D view of the laid-out route for the map
///
/// # Spatial index
/// Annotations are projected into the local tangent plane around `center`
/// and indexed in an R-Tree, so a map tap resolves to its annotation in
/// O(log n) instead of scanning every waypoint.
pub struct MapOverlay {
    center: GeoPoint,
    annotations: Vec<MapAnnotation>,
    route: Vec<GeoPoint>,
    index: RTree<IndexedAnnotation>,
}

impl MapOverlay {
    /// Step annotations first, then waypoints in route order
    pub fn build(center: GeoPoint, steps: &[RouteStep], legs: &[Leg]) -> Self {
        let annotations: Vec<MapAnnotation> = steps
            .iter()
            .map(MapAnnotation::for_step)
            .chain(
                legs.iter()
                    .flat_map(|leg| leg.intermediates.iter())
                    .map(MapAnnotation::for_waypoint),
            )
            .collect();

        let indexed: Vec<IndexedAnnotation> = annotations
            .iter()
            .enumerate()
            .map(|(i, a)| GeomWithData::new(project(&center, &a.coordinate), i))
            .collect();

        MapOverlay {
            center,
            annotations,
            route: dense_route(legs),
            index: RTree::bulk_load(indexed),
        }
    }

    /// Coordinate to centre the map on
    pub fn center(&self) -> &GeoPoint {
        &self.center
    }

    pub fn annotations(&self) -> &[MapAnnotation] {
        &self.annotations
    }

    /// Polyline through every route point
    pub fn route(&self) -> &[GeoPoint] {
        &self.route
    }

    pub fn step_annotations(&self) -> impl Iterator<Item = &MapAnnotation> {
        self.annotations
            .iter()
            .filter(|a| a.kind == MarkerKind::RouteStep)
    }

    /// Closest annotation to `point`, if within `max_distance_m`
    pub fn nearest(&self, point: &GeoPoint, max_distance_m: f64) -> Option<&MapAnnotation> {
        let query = project(&self.center, point);
        let hit = self.index.nearest_neighbor(&query)?;
        let annotation = self.annotations.get(hit.data)?;
        if distance(point, &annotation.coordinate) <= max_distance_m {
            Some(annotation)
        } else {
            None
        }
    }
}

fn project(center: &GeoPoint, point: &GeoPoint) -> [f64; 2] {
    let enu = enu_offset(center, point);
    [enu.x, enu.y]
}
