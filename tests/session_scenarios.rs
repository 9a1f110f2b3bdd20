use ar_nav_rs::{
    distance, GeoPoint, GeoTransform, LocationEstimator, LocationFix, LocationOutcome,
    LockOutcome, MarkerKind, MarkerTracker, NavConfig, NavSession, NotReady, RecordingSink,
    RenderCommand, RouteInterpolator, RouteStep,
};
use approx::assert_abs_diff_eq;

fn point(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::new(lat, lon).expect("valid point")
}

fn fix(lat: f64, lon: f64, accuracy: f64, t: f64) -> LocationFix {
    LocationFix::from_degrees(lat, lon, accuracy, t).expect("valid fix")
}

/// Route from Washington Square north then east
fn manhattan_route() -> Vec<RouteStep> {
    vec![
        RouteStep::new(point(40.7326, -73.9971), "Head north on 5th Ave"),
        RouteStep::new(point(40.7350, -73.9942), "Turn right onto E 14th St"),
        RouteStep::new(point(40.7362, -73.9794), "Arrive at destination"),
    ]
}

fn session() -> NavSession<RecordingSink> {
    NavSession::new(NavConfig::default(), RecordingSink::new()).expect("valid config")
}

#[test]
fn test_scenario_a_east_offset() {
    let origin = point(40.730, -73.997);
    let target = point(40.730, -73.996);
    let offset = GeoTransform::new().offset(&origin, &target);
    assert!(offset.east() > 0.0);
    assert_abs_diff_eq!(offset.north(), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(offset.magnitude(), 84.0, epsilon = 1.0);
}

#[test]
fn test_scenario_b_single_midpoint() {
    let s1 = point(40.730, -73.997);
    let one_degree = distance(&s1, &point(41.730, -73.997));
    let s2 = point(40.730 + 220.0 / one_degree, -73.997);
    let points = RouteInterpolator::new(100.0)
        .expect("valid spacing")
        .interpolate_leg(&s1, &s2);
    assert_eq!(points.len(), 1);
    assert_abs_diff_eq!(points[0].latitude(), (s1.latitude() + s2.latitude()) / 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(points[0].longitude(), -73.997, epsilon = 1e-12);
}

#[test]
fn test_scenario_c_origin_from_mixed_accuracy() {
    let history = [
        fix(40.7300, -73.9970, 80.0, 1.0),
        fix(40.7301, -73.9971, 40.0, 2.0),
        fix(40.7302, -73.9972, 90.0, 3.0),
    ];
    let origin = LocationEstimator::new(65.0)
        .estimate(&history)
        .expect("origin");
    assert_eq!(origin, history[1]);

    // Same result when fed through a session one fix at a time
    let mut session = session();
    let outcomes: Vec<LocationOutcome> = history.iter().map(|f| session.on_location(*f)).collect();
    assert!(matches!(outcomes[0], LocationOutcome::Ignored { .. }));
    assert!(matches!(outcomes[1], LocationOutcome::Accepted { .. }));
    assert!(matches!(outcomes[2], LocationOutcome::Ignored { .. }));
    assert_eq!(session.origin(), Some(&history[1]));
}

#[test]
fn test_scenario_d_clear_with_active_origin() {
    let mut session = session();
    session.on_location(fix(40.7306, -73.9970, 8.0, 1.0));
    session.on_route(manhattan_route());
    assert!(matches!(session.lock_origin(), LockOutcome::Placed { .. }));
    assert!(!session.markers().is_empty());

    session.reset();
    assert!(session.markers().is_empty());
    assert!(session.origin().is_some());
    assert_eq!(session.renderer().scene_len(), 0);
}

#[test]
fn test_refresh_moves_every_marker_to_new_origin() {
    let mut session = session();
    session.on_location(fix(40.7306, -73.9970, 30.0, 1.0));
    session.on_route(manhattan_route());
    session.lock_origin();
    let placed = session.markers().len();
    let batches_before = session.renderer().batches().len();

    // More accurate fix moves the origin
    let outcome = session.on_location(fix(40.7307, -73.9969, 5.0, 2.0));
    match outcome {
        LocationOutcome::Accepted {
            origin_changed,
            refreshed,
            ..
        } => {
            assert!(origin_changed);
            assert_eq!(refreshed, placed);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let new_origin = session.origin().expect("origin").point;
    let transform = GeoTransform::new();
    for marker in session.markers() {
        assert_eq!(marker.offset, transform.offset(&new_origin, &marker.point));
    }

    // The whole refresh arrives as one batch of updates
    let batches = session.renderer().batches();
    assert_eq!(batches.len(), batches_before + 1);
    let last = batches.last().expect("batch");
    assert_eq!(last.len(), placed);
    assert!(last
        .commands
        .iter()
        .all(|c| matches!(c, RenderCommand::Update(_))));

    // Renderer scene matches the tracker exactly
    for marker in session.markers() {
        let view = session.renderer().get(marker.id).expect("rendered");
        assert_eq!(view.transform, marker.offset.transform);
        assert_eq!(view.scale, marker.scale);
    }
}

#[test]
fn test_first_leg_starts_at_origin_not_first_step() {
    let mut session = session();
    let start = fix(40.7306, -73.9970, 10.0, 1.0);
    session.on_location(start);
    session.on_route(manhattan_route());
    session.lock_origin();

    let legs = session.legs();
    assert_eq!(legs.len(), 3);
    assert_eq!(legs[0].from, start.point);
    assert_eq!(legs[0].to, manhattan_route()[0].point);

    let dense = session.dense_route();
    assert_eq!(dense.first(), Some(&start.point));
    assert_eq!(dense.last(), Some(&manhattan_route()[2].point));

    let waypoints = session
        .markers()
        .iter()
        .filter(|m| m.kind == MarkerKind::Waypoint)
        .count();
    let intermediates: usize = legs.iter().map(|l| l.intermediates.len()).sum();
    assert_eq!(waypoints, intermediates);
}

#[test]
fn test_lock_waits_for_accurate_fix() {
    let mut session = session();
    session.on_route(manhattan_route());
    session.on_location(fix(40.7306, -73.9970, 200.0, 1.0));
    assert_eq!(session.lock_origin(), LockOutcome::Pending(NotReady::NoOrigin));
    assert!(session.markers().is_empty());
    assert!(session.renderer().batches().is_empty());
}

#[test]
fn test_tracker_queues_until_origin() {
    let mut tracker = MarkerTracker::from_config(&NavConfig::default(), RecordingSink::new());
    for step in manhattan_route() {
        tracker.add(step.point, step.instruction, MarkerKind::RouteStep);
    }
    assert!(tracker.all().is_empty());
    assert_eq!(tracker.queued_len(), 3);

    tracker.refresh_all(point(40.7306, -73.9970));
    assert_eq!(tracker.all().len(), 3);
    assert_eq!(tracker.sink().batches().len(), 1);
}

#[test]
fn test_sessions_are_independent() {
    let mut a = session();
    let mut b = session();
    a.on_location(fix(40.7306, -73.9970, 5.0, 1.0));
    b.on_location(fix(51.5072, -0.1276, 5.0, 1.0));
    assert_ne!(a.origin(), b.origin());
    assert_eq!(a.fixes().len(), 1);
    assert_eq!(b.fixes().len(), 1);
}
