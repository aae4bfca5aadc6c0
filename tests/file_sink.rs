use std::fs;
use std::path::Path;
use std::time::Duration;

use roadwatch::{
    components::{Car, TrafficLight},
    engine::{EngineBuilder, EngineSettings},
    rules::{RuleConfig, ViolationEvent, ViolationKind},
    scenario::Scenario,
    sink::{ArtifactPaths, FileSink, Ledger, SinkError, ViolationSink},
    world::{Scene, World},
};
use tempfile::tempdir;

fn crash_world() -> World {
    let mut world = World::new(
        Scene::default(),
        TrafficLight::new(900, 220, 150).expect("light"),
    );
    world.spawn_car(Car::new("car_1", 100, 270, 60, 30, 5).expect("car"));
    world.spawn_car(Car::new("car_2", 120, 275, 60, 30, 5).expect("car"));
    world
}

fn settings() -> EngineSettings {
    EngineSettings {
        scenario_name: "files".into(),
        rules: RuleConfig::default(),
        pacing: Duration::ZERO,
    }
}

fn files_with_extension(dir: &Path, extension: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(extension))
        .collect();
    names.sort();
    names
}

#[test]
fn writes_log_frame_and_payment_code() {
    let temp = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(temp.path().join("out"));
    let ledger = Scenario::downtown().ledger();
    let sink = FileSink::new(ledger, paths.clone()).expect("sink");
    let mut engine = EngineBuilder::new(settings(), crash_world())
        .with_sink(sink)
        .build();

    let summary = engine.tick().expect("tick");
    assert_eq!(summary.events.len(), 2);
    assert_eq!(summary.sink_failures, 0);

    let log = fs::read_to_string(&paths.log_file).expect("log");
    assert_eq!(log.matches(&"-".repeat(50)).count(), 2);
    assert!(log.contains("Vehicle ID: car_1"));
    assert!(log.contains("Owner: John Doe"));
    assert!(log.contains("Vehicle Number: XYZ456"));
    assert!(log.contains("Violation: accident"));
    assert!(log.contains("Tick: 1"));
    assert!(log.contains("Fine: 1000"));

    // Same-second artifacts for one vehicle and kind share a name.
    let frames = files_with_extension(&paths.frame_dir, ".jpg");
    assert_eq!(frames.len(), 2);
    assert!(frames[0].starts_with("car_1_accident_"));
    assert!(frames[1].starts_with("car_2_accident_"));

    let codes = files_with_extension(&paths.qr_dir, ".png");
    assert_eq!(codes.len(), 2);
    let code = image::open(paths.qr_dir.join(&codes[0])).expect("decode png");
    assert_eq!(code.width(), code.height());

    let frame = image::open(paths.frame_dir.join(&frames[0])).expect("decode jpg");
    assert_eq!((frame.width(), frame.height()), (1000, 600));
}

#[test]
fn unknown_vehicles_are_logged_with_placeholders() {
    let temp = tempdir().expect("tempdir");
    let paths = ArtifactPaths::under(temp.path());
    let mut sink = FileSink::new(Ledger::default(), paths.clone()).expect("sink");
    let frame = crash_world().snapshot(3);

    sink.record(&ViolationEvent::new("car_9", ViolationKind::Speeding, 3), &frame)
        .expect("record");

    let log = fs::read_to_string(&paths.log_file).expect("log");
    assert!(log.contains("Owner: Unknown"));
    assert!(log.contains("Vehicle Number: NA"));
    assert!(log.contains("Fine: 350"));
}

#[test]
fn failed_log_write_is_reported_but_the_run_continues() {
    let temp = tempdir().expect("tempdir");
    let mut paths = ArtifactPaths::under(temp.path());
    // A directory cannot be opened for appending.
    paths.log_file = temp.path().join("frames");
    let mut sink = FileSink::new(Ledger::default(), paths.clone()).expect("sink");

    let frame = crash_world().snapshot(1);
    let err = sink
        .record(&ViolationEvent::new("car_1", ViolationKind::Accident, 1), &frame)
        .expect_err("log write should fail");
    match err {
        SinkError::Artifacts(failures) => assert_eq!(failures.len(), 1),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(files_with_extension(&paths.qr_dir, ".png").len(), 1);

    let mut engine = EngineBuilder::new(settings(), crash_world())
        .with_sink(sink)
        .build();
    for _ in 0..3 {
        let summary = engine.tick().expect("tick keeps running");
        assert_eq!(summary.sink_failures, summary.events.len());
    }
    let run = engine.summary();
    assert_eq!(run.counts.get(ViolationKind::Accident), 6);
    assert_eq!(run.sink_failures, 6);
}
