use roadwatch::{
    rng::RngManager,
    rules::ViolationKind,
    scenario::{Scenario, ScenarioLoader},
};

fn loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn bundled_scenario_matches_the_builtin_roster() {
    let loaded = loader()
        .load("scenarios/downtown.yaml")
        .expect("scenario should load");
    let builtin = Scenario::downtown();

    assert_eq!(loaded.name, builtin.name);
    assert_eq!(loaded.seed, builtin.seed);
    assert_eq!(loaded.scene, builtin.scene);
    assert_eq!(loaded.rules, builtin.rules);
    assert_eq!(loaded.vehicles, builtin.vehicles);
    assert_eq!(loaded.fines, builtin.fines);
    assert_eq!(loaded.cars.len(), 7);
    assert_eq!(loaded.pedestrians.len(), 3);
    assert_eq!(loaded.animals.len(), 3);

    let ledger = loaded.ledger();
    assert_eq!(ledger.owner("car_4").owner_name, "Emma Davis");
    assert_eq!(ledger.fine(ViolationKind::AnimalCollision), 700);
}

#[test]
fn bundled_scenario_builds_the_same_world_as_the_builtin() {
    let loaded = loader()
        .load("scenarios/downtown.yaml")
        .expect("scenario should load");
    let from_file = loaded
        .build_world(&mut RngManager::new(loaded.seed))
        .expect("world");
    let builtin = Scenario::downtown();
    let from_code = builtin
        .build_world(&mut RngManager::new(builtin.seed))
        .expect("world");

    assert_eq!(from_file.entity_count(), 14);
    assert_eq!(from_file.snapshot(0), from_code.snapshot(0));
    assert_eq!(
        from_file.cars().iter().map(|c| c.speed).collect::<Vec<_>>(),
        from_code.cars().iter().map(|c| c.speed).collect::<Vec<_>>()
    );
}

#[test]
fn missing_file_names_the_path() {
    let err = loader()
        .load("scenarios/does_not_exist.yaml")
        .expect_err("missing file");
    assert!(format!("{err:#}").contains("does_not_exist.yaml"));
}
