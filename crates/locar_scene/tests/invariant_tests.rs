//! Invariant tests for locar_scene
//!
//! These tests verify scene invariants that must hold for any input

use locar_math::{GeoCoord, Vec3d};
use locar_scene::*;
use locar_xr::sim::{SimRenderable, SimWorld};
use locar_xr::{
    ArSession, DevicePose, GeoFix, RenderableAsset, SessionProvider, TrackingProvider,
    TrackingState, ViewDescriptor,
};
use parking_lot::Mutex;
use std::sync::Arc;

fn world_at(latitude: f64, longitude: f64) -> SimWorld {
    let world = SimWorld::new(GeoFix::new(GeoCoord::new(latitude, longitude), 0.0));
    world.set_tracking(TrackingState::Tracking);
    world
}

fn scene_for(world: &SimWorld, capacity: usize) -> AnchorScene {
    AnchorScene::new(
        capacity,
        world.anchor_store(),
        Box::new(world.geo_sensor()),
        SceneConfig::default(),
    )
}

fn view(title: &str) -> Arc<dyn RenderableAsset> {
    Arc::new(SimRenderable::new(ViewDescriptor::new("example_layout", title)))
}

fn tracked_device(world: &SimWorld, latitude: f64, longitude: f64) -> DevicePose {
    let fix = GeoFix::new(GeoCoord::new(latitude, longitude), 0.0);
    DevicePose::new(world.camera(), TrackingState::Tracking, Some(fix))
}

fn marker(latitude: f64, longitude: f64, title: &str) -> GeoMarker {
    GeoMarker::new(latitude, longitude, title, MarkerCategory::Other)
}

/// INVARIANT: tick does nothing unless the camera is tracking
#[test]
fn invariant_tick_is_noop_without_tracking() {
    let world = world_at(51.5, -0.1);
    let mut scene = scene_for(&world, 2);
    let device = tracked_device(&world, 51.5, -0.1);
    let a = Arc::new(SimRenderable::new(ViewDescriptor::new("example_layout", "A")));
    let a_view: Arc<dyn RenderableAsset> = a.clone();

    let id = scene
        .add_or_replace(marker(51.501, -0.1, "A"), &a_view, &device)
        .unwrap()
        .record()
        .unwrap();
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    scene.on_render_event(id, move |_| *counter.lock() += 1).unwrap();

    for tracking in [TrackingState::NotTracking, TrackingState::Paused] {
        for _ in 0..10 {
            let report = scene.tick(&device, tracking);
            assert!(report.skipped);
            assert_eq!(report.rendered, 0);
        }
    }

    assert_eq!(*calls.lock(), 0);
    assert_eq!(a.updates(), 0);
    assert!(scene.get(id).unwrap().last_distance().is_none());
    assert_eq!(scene.len(), 1);
}

/// INVARIANT: the scene never holds more records than its capacity
#[test]
fn invariant_capacity_never_exceeded() {
    let world = world_at(51.5, -0.1);
    let mut scene = scene_for(&world, 3);
    let device = tracked_device(&world, 51.5, -0.1);

    let markers: Vec<GeoMarker> = (0..5)
        .map(|i| marker(51.5 + i as f64 * 0.001, -0.1, &format!("M{}", i)))
        .collect();
    let views: Vec<_> = markers.iter().map(|m| view(m.title())).collect();

    for round in 0..20 {
        let i = (round * 7) % markers.len();
        let _ = scene.add_or_replace(markers[i].clone(), &views[i], &device);
        assert!(scene.len() <= scene.capacity());
        assert_eq!(world.live_anchors(), scene.len());
    }
    assert!(scene.is_at_capacity());
}

/// INVARIANT: a full scene ignores markers it does not already hold
#[test]
fn invariant_full_scene_drops_unknown_marker() {
    let world = world_at(51.5, -0.1);
    let mut scene = scene_for(&world, 3);
    let device = tracked_device(&world, 51.5, -0.1);

    for (i, title) in ["A", "B", "C"].iter().enumerate() {
        let placement = scene
            .add_or_replace(marker(51.5, -0.1 + i as f64 * 0.001, title), &view(title), &device)
            .unwrap();
        assert!(matches!(placement, Placement::Inserted(_)));
    }
    let before: Vec<RecordId> = scene.records().iter().map(AnchorRecord::id).collect();

    let placement = scene
        .add_or_replace(marker(51.6, -0.2, "D"), &view("D"), &device)
        .unwrap();

    assert_eq!(placement, Placement::Dropped);
    let after: Vec<RecordId> = scene.records().iter().map(AnchorRecord::id).collect();
    assert_eq!(before, after);
    assert!(!scene.contains_identity(&marker(51.6, -0.2, "D")));
    assert_eq!(world.live_anchors(), 3);
}

/// INVARIANT: detaching twice is the same as detaching once
#[test]
fn invariant_detach_idempotent() {
    let world = world_at(51.5, -0.1);
    let mut scene = scene_for(&world, 1);
    let device = tracked_device(&world, 51.5, -0.1);
    scene.add_or_replace(marker(51.5, -0.1, "A"), &view("A"), &device).unwrap();

    let mut records = scene.teardown();
    let record = &mut records[0];
    for _ in 0..3 {
        record.detach();
        assert_eq!(record.state(), RecordState::Detached);
        assert!(record.anchor_pose().is_none());
        assert_eq!(world.live_anchors(), 0);
    }
}

/// INVARIANT: teardown empties the scene and releases every anchor
#[test]
fn invariant_teardown_releases_everything() {
    let world = world_at(51.5, -0.1);
    let mut scene = scene_for(&world, 3);
    let device = tracked_device(&world, 51.5, -0.1);
    for title in ["A", "B", "C"] {
        scene.add_or_replace(marker(51.5, -0.101, title), &view(title), &device).unwrap();
    }
    // Replacement releases the evicted anchor too
    scene.add_or_replace(marker(51.5, -0.101, "B"), &view("B"), &device).unwrap();
    assert_eq!(world.live_anchors(), 3);

    let records = scene.teardown();
    assert!(scene.is_empty());
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.state() == RecordState::Detached));
    assert_eq!(world.live_anchors(), 0);

    assert!(scene.teardown().is_empty());
    let placement = scene.add_or_replace(marker(51.5, -0.1, "E"), &view("E"), &device).unwrap();
    assert_eq!(placement, Placement::Dropped);
    assert!(scene.is_empty());
}

/// INVARIANT: a marker at the device's own location is zero metres away
#[test]
fn invariant_zero_distance_at_projected_coordinate() {
    let world = world_at(20.9964248899242, 105.868930437133);
    let mut scene = scene_for(&world, 1);
    let device = tracked_device(&world, 20.9964248899242, 105.868930437133);

    let id = scene
        .add_or_replace(sample_markers().remove(0), &view("The Coffee House"), &device)
        .unwrap()
        .record()
        .unwrap();
    let distance = scene.get(id).unwrap().current_distance(&device).unwrap();
    assert!(distance.abs() < 1e-9);
}

/// INVARIANT: one record's panicking callback never stops the others
#[test]
fn invariant_callback_panic_is_contained() {
    let world = world_at(51.5, -0.1);
    let mut scene = scene_for(&world, 2);
    let device = tracked_device(&world, 51.5, -0.1);

    let a = scene.add_or_replace(marker(51.501, -0.1, "A"), &view("A"), &device).unwrap();
    let b = scene.add_or_replace(marker(51.502, -0.1, "B"), &view("B"), &device).unwrap();

    scene
        .on_render_event(a.record().unwrap(), |_| panic!("view detached from window"))
        .unwrap();
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    scene
        .on_render_event(b.record().unwrap(), move |_| *counter.lock() += 1)
        .unwrap();

    for _ in 0..3 {
        let report = scene.tick(&device, TrackingState::Tracking);
        assert_eq!(report.rendered, 1);
        assert_eq!(report.failed, 1);
    }
    assert_eq!(*calls.lock(), 3);
    assert_eq!(scene.len(), 2);
}

/// INVARIANT: distances are finite, positive and grow as the device walks away
#[test]
fn invariant_end_to_end_distances() {
    let world = world_at(51.45, 0.0);
    let mut session = world.session_provider().create_session(false).unwrap().unwrap();
    session.resume().unwrap();
    let mut scene = AnchorScene::new(
        2,
        session.anchor_store(),
        Box::new(world.geo_sensor()),
        SceneConfig::default(),
    );

    let frame = session.current_frame().unwrap();
    let device = scene.device_pose(&frame);
    assert!(device.is_tracked());

    let events: Arc<Mutex<Vec<RenderEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let views = [view("A"), view("B")];
    for (m, v) in [marker(51.5, -0.1, "A"), marker(51.6, -0.2, "B")].into_iter().zip(&views) {
        let id = scene.add_or_replace(m, v, &device).unwrap().record().unwrap();
        let sink = Arc::clone(&events);
        scene.on_render_event(id, move |e| sink.lock().push(e.clone())).unwrap();
    }

    scene.tick(&device, frame.tracking_state());
    let first: Vec<RenderEvent> = events.lock().drain(..).collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].name, "A");
    assert_eq!(first[1].name, "B");
    for event in &first {
        assert!(event.distance_m.is_finite());
        assert!(event.distance_m > 0.0);
    }
    assert!(first[0].distance_m < first[1].distance_m);

    // Walk south-east, away from both markers
    world.translate_camera(Vec3d::new(250.0, 0.0, 250.0));
    let frame = session.current_frame().unwrap();
    let device = scene.device_pose(&frame);
    scene.tick(&device, frame.tracking_state());

    let second: Vec<RenderEvent> = events.lock().drain(..).collect();
    assert_eq!(second.len(), 2);
    for (before, after) in first.iter().zip(&second) {
        assert_eq!(before.record, after.record);
        assert!(after.distance_m > before.distance_m);
    }
}

/// INVARIANT: the anchor store is empty once the scene is dropped
#[test]
fn invariant_no_anchor_leaks_on_drop() {
    let world = world_at(51.5, -0.1);
    let device = tracked_device(&world, 51.5, -0.1);
    {
        let mut scene = scene_for(&world, 2);
        for round in 0..10 {
            let title = if round % 2 == 0 { "A" } else { "B" };
            scene.add_or_replace(marker(51.5, -0.1, title), &view(title), &device).unwrap();
        }
        assert_eq!(world.live_anchors(), 2);
    }
    assert_eq!(world.live_anchors(), 0);
}
