use assert_approx_eq::assert_approx_eq;
use glam::Vec3;
use orrery_engine::config::EngineConfig;
use orrery_engine::data::{read_coordinate_set_from_file, write_coordinate_set_to_file};
use orrery_engine::feed::feed::{CoordinateFeed, FeedResponse, StaticFeed};
use orrery_engine::scene::manager::{FeedStatus, RefreshOutcome, SceneStateManager};
use orrery_engine::{CameraState, CoordinateSet, GLOBAL_TILT};

const FEED_BODY: &str = r#"{
    "success": true,
    "data": {
        "sun":     {"timestamp": "2024-03-20T00:00:00Z", "x": 0.0,   "y": 0.0,  "z": 0.0},
        "mercury": {"timestamp": "2024-03-20T00:00:00Z", "x": 0.5,   "y": 0.0,  "z": 0.0},
        "venus":   {"timestamp": "2024-03-20T00:00:00Z", "x": 0.0,   "y": 0.2,  "z": 0.0},
        "earth":   {"timestamp": "2024-03-20T00:00:00Z", "x": 1.0,   "y": 0.0,  "z": 0.0},
        "mars":    {"timestamp": "2024-03-20T00:00:00Z", "x": 0.0,   "y": 0.0,  "z": 0.8},
        "jupiter": {"timestamp": "2024-03-20T00:00:00Z", "x": -5.2,  "y": 0.0,  "z": 0.0},
        "saturn":  {"timestamp": "2024-03-20T00:00:00Z", "x": 0.0,   "y": -9.5, "z": 0.0},
        "uranus":  {"timestamp": "2024-03-20T00:00:00Z", "x": 19.0,  "y": 0.0,  "z": 0.0}
    }
}"#;

fn feed_set(timestamp: &str) -> CoordinateSet {
    FeedResponse::from_json(FEED_BODY.as_bytes())
        .expect("payload")
        .into_coordinate_set(timestamp)
        .expect("set")
}

#[test]
fn integration_end_to_end_frame() {
    let mut scene = SceneStateManager::new(EngineConfig::default()).expect("scene");
    let ticket = scene.begin_refresh("2024-03-20T00:00:00Z");
    let outcome = scene.complete_refresh(ticket.sequence, Ok(feed_set(&ticket.timestamp)));
    assert_eq!(outcome, RefreshOutcome::Applied);

    // Transformer
    let earth = &scene.placements()[scene.catalog().index_of_id("earth").unwrap()];
    assert_eq!(earth.position.pos, Vec3::new(10.0, 0.0, 0.0));
    assert_eq!(earth.tilt.total_inclination_rad, GLOBAL_TILT);
    let neptune = &scene.placements()[scene.catalog().index_of_id("neptune").unwrap()];
    assert!(neptune.fallback);
    assert_eq!(neptune.position.pos, Vec3::new(10.0, 0.0, 0.0));

    // Ranking from the origin: sun, venus, mercury, mars, then ties at 1 AU by id
    let frame = scene.frame(16.0);
    let ids: Vec<&str> = frame.ranking.iter().map(|r| &*r.body_id).collect();
    assert_eq!(
        ids,
        vec!["sun", "venus", "mercury", "mars", "earth", "neptune", "jupiter", "saturn", "uranus"]
    );
    assert_approx_eq!(frame.ranking[4].distance_au, 1.0, 1e-6);
    assert_approx_eq!(frame.ranking[8].distance_au, 19.0, 1e-4);

    // Projection: the sun sits at the look-at target
    let sun = frame.screen_positions["sun"];
    assert_approx_eq!(sun.x, 640.0, 1e-2);
    assert_approx_eq!(sun.y, 360.0, 1e-2);
    assert_eq!(frame.ranking[0].screen_pos, sun);
}

#[test]
fn integration_focus_survives_refresh() {
    let mut scene = SceneStateManager::new(EngineConfig::default()).expect("scene");
    scene.rebuild_scene(feed_set("2024-03-20T00:00:00Z"));

    assert!(scene.focus("jupiter", 1_000.0));
    let mid = scene.frame(1_300.0).camera;
    assert!(scene.is_flying());

    let ticket = scene.begin_refresh("2024-03-21T00:00:00Z");
    scene.complete_refresh(ticket.sequence, Ok(feed_set(&ticket.timestamp)));
    assert_eq!(scene.camera_state(), mid);

    let landed = scene.frame(2_000.0);
    assert!(!landed.flying);
    assert_eq!(landed.camera.target, Vec3::new(-52.0, 0.0, 0.0));
    // 3x Jupiter's render radius
    assert_approx_eq!((landed.camera.position - landed.camera.target).length(), 3.6, 1e-4);

    let jupiter = landed.screen_positions["jupiter"];
    assert_approx_eq!(jupiter.x, 640.0, 1e-2);
    assert_approx_eq!(jupiter.y, 360.0, 1e-2);
}

#[test]
fn integration_stale_and_failed_refreshes() {
    let mut scene = SceneStateManager::new(EngineConfig::default()).expect("scene");
    let feed = StaticFeed {
        set: feed_set("2024-03-20T00:00:00Z"),
    };

    let slow = scene.begin_refresh("2024-03-20T00:00:00Z");
    let fast = scene.begin_refresh("2024-03-22T00:00:00Z");
    let fast_result = feed.fetch(&fast.timestamp);
    let slow_result = feed.fetch(&slow.timestamp);
    assert_eq!(scene.complete_refresh(fast.sequence, fast_result), RefreshOutcome::Applied);
    assert_eq!(scene.complete_refresh(slow.sequence, slow_result), RefreshOutcome::Stale);
    assert_eq!(scene.coordinates().unwrap().timestamp, "2024-03-22T00:00:00Z");

    let broken = scene.begin_refresh("not-a-date");
    let result = feed.fetch(&broken.timestamp);
    assert_eq!(scene.complete_refresh(broken.sequence, result), RefreshOutcome::Failed);
    assert!(matches!(scene.feed_status(), FeedStatus::Failed { .. }));
    assert_eq!(scene.frame(0.0).ranking.len(), 9);
}

#[test]
fn integration_bundle_feeds_scene() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("coordinates.bin");
    write_coordinate_set_to_file(&feed_set("2024-03-20T00:00:00Z"), &path).expect("write");

    let mut scene = SceneStateManager::new(EngineConfig::default()).expect("scene");
    scene.rebuild_scene(read_coordinate_set_from_file(&path).expect("read"));
    scene.set_reference_point(Vec3::new(-52.0, 0.0, 0.0));
    let frame = scene.frame(0.0);
    assert_eq!(&*frame.ranking[0].body_id, "jupiter");
    assert_eq!(frame.camera, CameraState::default());
}
