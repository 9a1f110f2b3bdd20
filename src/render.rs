//! Boundary to the rendering collaborator
//!
//! The engine never touches scene-graph primitives. Each tracker mutation
//! is delivered as one `RenderBatch`, fully computed before delivery, so a
//! renderer that applies a batch inside a single transaction never shows a
//! mix of old-origin and new-origin placements.

use crate::markers::{Marker, MarkerId, MarkerKind};
use crate::types::{position_from_transform, WorldTransform, WorldVec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerColor {
    Green,
    Blue,
}

/// Everything a renderer needs to place one marker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerView {
    pub id: MarkerId,
    pub label: String,
    pub kind: MarkerKind,
    pub transform: WorldTransform,
    pub scale: f64,
    pub sphere_radius: f64,
    pub color: MarkerColor,
}

impl MarkerView {
    pub fn position(&self) -> WorldVec {
        position_from_transform(&self.transform)
    }
}

impl From<&Marker> for MarkerView {
    fn from(marker: &Marker) -> Self {
        MarkerView {
            id: marker.id,
            label: marker.label.clone(),
            kind: marker.kind,
            transform: marker.offset.transform,
            scale: marker.scale,
            sphere_radius: marker.kind.sphere_radius(),
            color: marker.kind.color(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    Add(MarkerView),
    Update(MarkerView),
    Remove(MarkerId),
}

impl RenderCommand {
    pub fn marker_id(&self) -> MarkerId {
        match self {
            RenderCommand::Add(view) | RenderCommand::Update(view) => view.id,
            RenderCommand::Remove(id) => *id,
        }
    }
}

/// Atomic set of changes plus the animation duration to apply them over
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderBatch {
    pub commands: Vec<RenderCommand>,
    pub animation_secs: f64,
}

impl RenderBatch {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

/// Rendering collaborator
pub trait RenderSink {
    fn apply(&mut self, batch: RenderBatch);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn apply(&mut self, _batch: RenderBatch) {}
}

/// In-memory renderer: keeps every batch and the resulting live scene
#[derive(Debug, Default)]
pub struct RecordingSink {
    batches: Vec<RenderBatch>,
    scene: BTreeMap<MarkerId, MarkerView>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[RenderBatch] {
        &self.batches
    }

    pub fn last_batch(&self) -> Option<&RenderBatch> {
        self.batches.last()
    }

    /// Objects currently in the scene, ordered by id
    pub fn scene(&self) -> impl Iterator<Item = &MarkerView> {
        self.scene.values()
    }

    pub fn scene_len(&self) -> usize {
        self.scene.len()
    }

    pub fn get(&self, id: MarkerId) -> Option<&MarkerView> {
        self.scene.get(&id)
    }
}

impl RenderSink for RecordingSink {
    fn apply(&mut self, batch: RenderBatch) {
        for command in &batch.commands {
            match command {
                RenderCommand::Add(view) | RenderCommand::Update(view) => {
                    self.scene.insert(view.id, view.clone());
                }
                RenderCommand::Remove(id) => {
                    self.scene.remove(id);
                }
            }
        }
        self.batches.push(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_transform::Offset3D;
    use crate::types::GeoPoint;

    fn marker(id: u64, kind: MarkerKind) -> Marker {
        Marker {
            id: MarkerId(id),
            point: GeoPoint::new(1.0, 2.0).expect("valid"),
            label: format!("m{}", id),
            kind,
            offset: Offset3D::zero(),
            scale: 1.0,
        }
    }

    #[test]
    fn test_view_carries_kind_visuals() {
        let step = MarkerView::from(&marker(1, MarkerKind::RouteStep));
        assert_eq!(step.color, MarkerColor::Green);
        assert_eq!(step.sphere_radius, 0.3);

        let waypoint = MarkerView::from(&marker(2, MarkerKind::Waypoint));
        assert_eq!(waypoint.color, MarkerColor::Blue);
        assert_eq!(waypoint.sphere_radius, 0.25);
    }

    #[test]
    fn test_view_position_is_translation_column() {
        let origin = GeoPoint::new(40.730, -73.997).expect("valid");
        let target = GeoPoint::new(40.731, -73.996).expect("valid");
        let mut m = marker(3, MarkerKind::Waypoint);
        m.offset = crate::geo_transform::GeoTransform::new().offset(&origin, &target);

        let view = MarkerView::from(&m);
        let position = view.position();
        assert_eq!(position, m.offset.position());
        assert_eq!(position.x, m.offset.east());
        assert_eq!(position.z, -m.offset.north());
    }

    #[test]
    fn test_recording_sink_tracks_scene() {
        let mut sink = RecordingSink::new();
        sink.apply(RenderBatch {
            commands: vec![
                RenderCommand::Add(MarkerView::from(&marker(1, MarkerKind::RouteStep))),
                RenderCommand::Add(MarkerView::from(&marker(2, MarkerKind::Waypoint))),
            ],
            animation_secs: 0.0,
        });
        assert_eq!(sink.scene_len(), 2);

        sink.apply(RenderBatch {
            commands: vec![RenderCommand::Remove(MarkerId(1))],
            animation_secs: 0.0,
        });
        assert_eq!(sink.scene_len(), 1);
        assert!(sink.get(MarkerId(1)).is_none());
        assert_eq!(sink.batches().len(), 2);
        assert_eq!(sink.last_batch().map(|b| b.len()), Some(1));
    }
}
