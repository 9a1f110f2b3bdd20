use crate::config::NavConfig;
use crate::error::{NavError, NavResult, NotReady, UserMessage};
use crate::estimator::LocationEstimator;
use crate::markers::{Marker, MarkerKind, MarkerTracker};
use crate::overlay::MapOverlay;
use crate::render::RenderSink;
use crate::route::{dense_route, Leg, RouteInterpolator};
use crate::types::{GeoPoint, LocationFix, RouteStep};
use serde::{Deserialize, Serialize};

/// AR camera tracking quality as reported by the AR session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingState {
    Normal,
    NotAvailable,
    Limited(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationOutcome {
    /// Accuracy radius above the threshold; kept in history, nothing changed
    Ignored { horizontal_accuracy: f64 },
    /// Origin re-estimated and every marker re-placed
    Accepted {
        origin: LocationFix,
        origin_changed: bool,
        refreshed: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Stored { steps: usize },
    /// Markers are already laid out for the current route
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LockOutcome {
    Placed {
        origin: LocationFix,
        steps: usize,
        waypoints: usize,
    },
    AlreadyPlaced,
    Pending(NotReady),
}

/// Single owner of all mutable navigation state
///
/// # Ownership
/// - Fix history (append-only) and the active origin. The tracker only
///   mirrors the origin's point as its placement frame, written through
///   `refresh_all` right after the origin changes here.
/// - Route snapshot and the legs laid out from it
/// - Marker set, through the tracker
///
/// Every mutation goes through `&mut self`, so a refresh is complete before
/// any reader sees marker state. Independent sessions share nothing.
///
/// # Trigger policy
/// Each accurate fix re-estimates the origin over the whole history and
/// re-places every marker. No smoothing is applied.
pub struct NavSession<S: RenderSink> {
    config: NavConfig,
    estimator: LocationEstimator,
    interpolator: RouteInterpolator,
    fixes: Vec<LocationFix>,
    origin: Option<LocationFix>,
    route: Option<Vec<RouteStep>>,
    legs: Vec<Leg>,
    overlay: Option<MapOverlay>,
    tracker: MarkerTracker<S>,
}

impl<S: RenderSink> NavSession<S> {
    pub fn new(config: NavConfig, sink: S) -> NavResult<Self> {
        config.validate()?;
        let estimator = LocationEstimator::new(config.accuracy_threshold_m);
        let interpolator = RouteInterpolator::new(config.interpolation_spacing_m)?;
        let tracker = MarkerTracker::from_config(&config, sink);

        Ok(NavSession {
            config,
            estimator,
            interpolator,
            fixes: Vec::new(),
            origin: None,
            route: None,
            legs: Vec::new(),
            overlay: None,
            tracker,
        })
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn origin(&self) -> Option<&LocationFix> {
        self.origin.as_ref()
    }

    pub fn fixes(&self) -> &[LocationFix] {
        &self.fixes
    }

    pub fn route(&self) -> Option<&[RouteStep]> {
        self.route.as_deref()
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn dense_route(&self) -> Vec<GeoPoint> {
        dense_route(&self.legs)
    }

    pub fn markers(&self) -> &[Marker] {
        self.tracker.all()
    }

    pub fn overlay(&self) -> Option<&MapOverlay> {
        self.overlay.as_ref()
    }

    pub fn is_placed(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn renderer(&self) -> &S {
        self.tracker.sink()
    }

    pub fn into_renderer(self) -> S {
        self.tracker.into_sink()
    }

    /// Location subsystem delivered a fix
    pub fn on_location(&mut self, fix: LocationFix) -> LocationOutcome {
        self.fixes.push(fix);

        if !self.estimator.is_admissible(&fix) {
            log::trace!(
                "Ignoring fix with accuracy {:.1} m (threshold {:.1} m)",
                fix.horizontal_accuracy,
                self.estimator.accuracy_threshold_m()
            );
            return LocationOutcome::Ignored {
                horizontal_accuracy: fix.horizontal_accuracy,
            };
        }

        // An admissible fix was just pushed, so the estimate exists
        let origin = match self.estimator.estimate(&self.fixes) {
            Some(origin) => origin,
            None => fix,
        };
        let origin_changed = self.origin.map_or(true, |previous| previous != origin);
        if origin_changed {
            log::info!(
                "Origin set to {} (accuracy {:.1} m)",
                origin.point,
                origin.horizontal_accuracy
            );
        }
        self.origin = Some(origin);
        let refreshed = self.tracker.refresh_all(origin.point);
        debug_assert!(self.placement_frame_matches_origin());

        LocationOutcome::Accepted {
            origin,
            origin_changed,
            refreshed,
        }
    }

    /// Location subsystem reported a failure; prior state stays in use
    pub fn on_location_error(&self, message: &str) -> UserMessage {
        let error = NavError::LocationFailed(message.to_string());
        log::warn!("{}", error);
        UserMessage::from(&error)
    }

    /// Routing subsystem delivered the steps for the requested destination
    pub fn on_route(&mut self, steps: Vec<RouteStep>) -> RouteOutcome {
        if self.is_placed() {
            log::warn!("Route received after markers were placed; keeping current route");
            return RouteOutcome::Ignored;
        }
        log::info!("Route received with {} steps", steps.len());
        let count = steps.len();
        self.route = Some(steps);
        RouteOutcome::Stored { steps: count }
    }

    /// Routing failed; any previously received route stays in use
    pub fn on_route_error(&self, message: &str) -> UserMessage {
        let error = NavError::RoutingFailed(message.to_string());
        log::warn!("{}", error);
        UserMessage::from(&error)
    }

    pub fn on_tracking_state(&self, state: &TrackingState) {
        match state {
            TrackingState::Normal => log::info!("AR tracking ready"),
            TrackingState::NotAvailable => log::info!("AR tracking not available, waiting"),
            TrackingState::Limited(reason) => log::info!("AR tracking limited: {}", reason),
        }
    }

    pub fn on_interrupted(&self) -> UserMessage {
        log::warn!("AR session interrupted");
        UserMessage::error("Session interrupted")
    }

    /// Manual trigger: fix the origin and lay out the route as markers
    ///
    /// Route steps are placed first, then every interpolated waypoint in
    /// route order, in a single render batch.
    pub fn lock_origin(&mut self) -> LockOutcome {
        if self.is_placed() {
            return LockOutcome::AlreadyPlaced;
        }
        if self.fixes.is_empty() {
            return LockOutcome::Pending(NotReady::NoFixes);
        }
        let origin = match self.estimator.estimate(&self.fixes) {
            Some(origin) => origin,
            None => return LockOutcome::Pending(NotReady::NoOrigin),
        };
        let steps = match &self.route {
            Some(steps) if !steps.is_empty() => steps.clone(),
            _ => return LockOutcome::Pending(NotReady::NoRoute),
        };

        let legs = match self.interpolator.build_legs(Some(&origin.point), &steps) {
            Ok(legs) => legs,
            Err(pending) => return LockOutcome::Pending(pending),
        };

        if self.tracker.origin() != Some(&origin.point) {
            self.tracker.refresh_all(origin.point);
        }
        self.origin = Some(origin);

        let step_markers = steps
            .iter()
            .map(|s| (s.point, s.instruction.clone(), MarkerKind::RouteStep));
        let waypoint_markers = legs
            .iter()
            .flat_map(|leg| leg.intermediates.iter())
            .map(|p| (*p, p.to_string(), MarkerKind::Waypoint));
        let placed = self.tracker.add_many(step_markers.chain(waypoint_markers));

        let waypoints = placed.len() - steps.len();
        log::info!(
            "Placed {} step markers and {} waypoints around {}",
            steps.len(),
            waypoints,
            origin.point
        );

        self.overlay = Some(MapOverlay::build(origin.point, &steps, &legs));
        self.legs = legs;
        debug_assert!(self.placement_frame_matches_origin());

        LockOutcome::Placed {
            origin,
            steps: steps.len(),
            waypoints,
        }
    }

    /// Reset button: remove every marker
    ///
    /// Route and fix history survive, so `lock_origin` can lay the route out
    /// again around the current origin.
    pub fn reset(&mut self) -> usize {
        let removed = self.tracker.clear();
        self.legs.clear();
        self.overlay = None;
        log::info!("Reset: removed {} markers", removed);
        removed
    }

    fn placement_frame_matches_origin(&self) -> bool {
        self.tracker.origin() == self.origin.as_ref().map(|fix| &fix.point)
    }
}
