//! Route-to-AR marker placement
//!
//! Turns a sparse route and a noisy stream of GPS fixes into markers placed
//! in a local East-North-Up frame around the best available fix, and keeps
//! them consistent as that origin is re-estimated.

pub mod config;
pub mod error;
pub mod estimator;
pub mod geo_transform;
pub mod markers;
pub mod overlay;
pub mod render;
pub mod route;
pub mod session;
pub mod types;

pub use config::{NavConfig, ScaleMapping};
pub use error::{NavError, NavResult, NotReady, UserMessage};
pub use estimator::LocationEstimator;
pub use geo_transform::{distance, GeoTransform, Offset3D};
pub use markers::{AddOutcome, Marker, MarkerId, MarkerKind, MarkerTracker};
pub use overlay::{MapAnnotation, MapOverlay};
pub use render::{MarkerColor, MarkerView, NullSink, RecordingSink, RenderBatch, RenderCommand, RenderSink};
pub use route::{dense_route, Leg, RouteInterpolator};
pub use session::{LocationOutcome, LockOutcome, NavSession, RouteOutcome, TrackingState};
pub use types::{GeoPoint, LocationFix, RouteStep};
