use crate::config::{NavConfig, ScaleMapping};
use crate::geo_transform::{distance, GeoTransform, Offset3D};
use crate::render::{MarkerColor, MarkerView, RenderBatch, RenderCommand, RenderSink};
use crate::types::GeoPoint;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    /// A step of the route (turn instruction)
    RouteStep,
    /// An interpolated point between steps
    Waypoint,
}

impl MarkerKind {
    /// Sphere radius in meters before distance scaling
    pub fn sphere_radius(&self) -> f64 {
        match self {
            MarkerKind::RouteStep => 0.3,
            MarkerKind::Waypoint => 0.25,
        }
    }

    pub fn color(&self) -> MarkerColor {
        match self {
            MarkerKind::RouteStep => MarkerColor::Green,
            MarkerKind::Waypoint => MarkerColor::Blue,
        }
    }
}

/// A placed marker: coordinate plus its origin-relative placement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub point: GeoPoint,
    pub label: String,
    pub kind: MarkerKind,
    pub offset: Offset3D,
    pub scale: f64,
}

/// Marker waiting for the first origin
#[derive(Clone, Debug, PartialEq)]
struct QueuedMarker {
    id: MarkerId,
    point: GeoPoint,
    label: String,
    kind: MarkerKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// Placed against the current origin
    Placed(MarkerId),
    /// No origin yet; placed on the next `refresh_all`
    Queued(MarkerId),
}

impl AddOutcome {
    pub fn id(&self) -> MarkerId {
        match self {
            AddOutcome::Placed(id) | AddOutcome::Queued(id) => *id,
        }
    }
}

/// Owner of all placed markers
///
/// # Origin
/// The tracker does not estimate or choose an origin. It keeps the point of
/// the last `refresh_all` as its placement frame, and new markers are placed
/// against that frame. Inside a `NavSession` the session owns the origin fix
/// and is the only caller of `refresh_all`, so the frame always equals the
/// session origin's point.
///
/// # Batching
/// Every mutation computes the complete new marker state first, swaps it in,
/// then hands the renderer exactly one batch. Nothing is deduplicated: adding
/// the same coordinate twice yields two markers.
pub struct MarkerTracker<S: RenderSink> {
    transform: GeoTransform,
    scale: ScaleMapping,
    animation_secs: f64,
    origin: Option<GeoPoint>,
    markers: Vec<Marker>,
    queued: Vec<QueuedMarker>,
    next_id: u64,
    sink: S,
}

impl<S: RenderSink> MarkerTracker<S> {
    pub fn new(transform: GeoTransform, scale: ScaleMapping, animation_secs: f64, sink: S) -> Self {
        MarkerTracker {
            transform,
            scale,
            animation_secs,
            origin: None,
            markers: Vec::new(),
            queued: Vec::new(),
            next_id: 0,
            sink,
        }
    }

    pub fn from_config(config: &NavConfig, sink: S) -> Self {
        Self::new(
            GeoTransform::from_heading_correction(config.heading_correction_deg),
            config.scale,
            config.refresh_animation_secs,
            sink,
        )
    }

    pub fn origin(&self) -> Option<&GeoPoint> {
        self.origin.as_ref()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Placed markers in insertion order
    pub fn all(&self) -> &[Marker] {
        &self.markers
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn add(&mut self, point: GeoPoint, label: impl Into<String>, kind: MarkerKind) -> AddOutcome {
        let mut commands = Vec::with_capacity(1);
        let outcome = self.add_one(point, label.into(), kind, &mut commands);
        self.emit(commands);
        outcome
    }

    /// Add several markers as one render batch
    pub fn add_many<I>(&mut self, items: I) -> Vec<AddOutcome>
    where
        I: IntoIterator<Item = (GeoPoint, String, MarkerKind)>,
    {
        let mut commands = Vec::new();
        let outcomes: Vec<AddOutcome> = items
            .into_iter()
            .map(|(point, label, kind)| self.add_one(point, label, kind, &mut commands))
            .collect();

        if !self.queued.is_empty() {
            log::debug!("{} markers waiting for an origin", self.queued.len());
        }
        self.emit(commands);
        outcomes
    }

    /// Place against the current origin or queue; render commands are
    /// collected by the caller
    fn add_one(
        &mut self,
        point: GeoPoint,
        label: String,
        kind: MarkerKind,
        commands: &mut Vec<RenderCommand>,
    ) -> AddOutcome {
        let id = self.allocate_id();
        match self.origin {
            Some(origin) => {
                let marker = self.place(&origin, id, point, label, kind);
                commands.push(RenderCommand::Add(MarkerView::from(&marker)));
                self.markers.push(marker);
                AddOutcome::Placed(id)
            }
            None => {
                self.queued.push(QueuedMarker {
                    id,
                    point,
                    label,
                    kind,
                });
                AddOutcome::Queued(id)
            }
        }
    }

    /// Re-place every marker (and any queued ones) against `origin`
    ///
    /// Returns the number of markers now placed.
    pub fn refresh_all(&mut self, origin: GeoPoint) -> usize {
        let mut commands = Vec::with_capacity(self.markers.len() + self.queued.len());

        let mut refreshed: Vec<Marker> = self
            .markers
            .iter()
            .map(|m| self.place(&origin, m.id, m.point, m.label.clone(), m.kind))
            .collect();
        commands.extend(
            refreshed
                .iter()
                .map(|m| RenderCommand::Update(MarkerView::from(m))),
        );

        let queued = std::mem::take(&mut self.queued);
        for q in queued {
            let marker = self.place(&origin, q.id, q.point, q.label, q.kind);
            commands.push(RenderCommand::Add(MarkerView::from(&marker)));
            refreshed.push(marker);
        }

        self.origin = Some(origin);
        self.markers = refreshed;
        log::debug!("Refreshed {} markers against {}", self.markers.len(), origin);
        self.emit(commands);
        self.markers.len()
    }

    /// Remove one marker (placed or queued)
    pub fn remove(&mut self, id: MarkerId) -> bool {
        if let Some(index) = self.markers.iter().position(|m| m.id == id) {
            self.markers.remove(index);
            self.emit(vec![RenderCommand::Remove(id)]);
            return true;
        }
        if let Some(index) = self.queued.iter().position(|q| q.id == id) {
            self.queued.remove(index);
            return true;
        }
        false
    }

    /// Drop every marker and tell the renderer to release them
    ///
    /// The origin is kept. Returns how many placed markers were removed.
    pub fn clear(&mut self) -> usize {
        let removed = std::mem::take(&mut self.markers);
        self.queued.clear();
        let commands: Vec<RenderCommand> = removed
            .iter()
            .map(|m| RenderCommand::Remove(m.id))
            .collect();
        self.emit(commands);
        removed.len()
    }

    fn place(
        &self,
        origin: &GeoPoint,
        id: MarkerId,
        point: GeoPoint,
        label: String,
        kind: MarkerKind,
    ) -> Marker {
        let offset = self.transform.offset(origin, &point);
        let scale = self.scale.scale_for(distance(origin, &point));
        Marker {
            id,
            point,
            label,
            kind,
            offset,
            scale,
        }
    }

    fn allocate_id(&mut self) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        id
    }

    fn emit(&mut self, commands: Vec<RenderCommand>) {
        if commands.is_empty() {
            return;
        }
        self.sink.apply(RenderBatch {
            commands,
            animation_secs: self.animation_secs,
        });
    }
}
