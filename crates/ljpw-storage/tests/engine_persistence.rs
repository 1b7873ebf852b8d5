use ljpw_core::{Engine, EngineConfig, StateVector};
use ljpw_storage::Storage;
use std::{
    fs,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn engine_sink_persists_steps_and_improvements() {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_micros();
    let path = std::env::temp_dir().join(format!(
        "ljpw_storage_test_{}_{}.duckdb",
        std::process::id(),
        timestamp
    ));
    let path_str = path.to_str().expect("utf8 path");

    let config = EngineConfig {
        rng_seed: Some(0xDEADBEEF),
        history_capacity: Some(8),
        ..EngineConfig::default()
    };
    let storage = Storage::with_thresholds(path_str, 4, 4)
        .expect("storage")
        .with_run("integration")
        .expect("run");

    let (final_state, recorded) = {
        let mut engine = Engine::with_sink(
            StateVector::new(0.3, 0.5, 0.9, 0.5),
            config,
            Box::new(storage),
        )
        .expect("engine");
        engine.simulate(3.0, 0.1).expect("simulate");
        let report = engine.self_improve(6, 0.05).expect("improve");
        assert_eq!(engine.history().len(), 8);
        (engine.state(), report.iterations)
    };

    // Dropping the engine drops the sink, which flushes the tail of the buffer.
    let mut storage = Storage::open(path_str).expect("reopen");
    let trajectory = storage.trajectory("integration", 1_000).expect("trajectory");
    assert_eq!(trajectory.len(), 30);
    assert_eq!(trajectory.last().map(|p| p.state), Some(final_state));

    let summary = storage
        .efficiency_summary("integration")
        .expect("summary")
        .expect("rows");
    assert_eq!(summary.steps, 30);
    assert!(summary.max >= summary.mean);

    let improvements = storage.improvements("integration").expect("improvements");
    assert!(!improvements.is_empty());
    assert_eq!(improvements, recorded);
    assert_eq!(storage.runs().expect("runs"), vec!["integration".to_string()]);

    drop(storage);
    let _ = fs::remove_file(path);
}

#[test]
fn rerun_under_same_label_replaces_steps() {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_micros();
    let path = std::env::temp_dir().join(format!(
        "ljpw_storage_rerun_{}_{}.duckdb",
        std::process::id(),
        timestamp
    ));
    let path_str = path.to_str().expect("utf8 path");
    let config = EngineConfig {
        rng_seed: Some(1),
        ..EngineConfig::default()
    };

    let run = |start: StateVector, duration: f64| {
        let storage = Storage::open(path_str)
            .expect("storage")
            .with_run("cli")
            .expect("run");
        let mut engine =
            Engine::with_sink(start, config.clone(), Box::new(storage)).expect("engine");
        engine.simulate(duration, 0.1).expect("simulate");
        engine.self_improve(2, 0.05).expect("improve");
        (engine.state(), engine.efficiency())
    };

    run(StateVector::new(0.3, 0.5, 0.9, 0.5), 10.0);
    let (final_state, final_efficiency) = run(StateVector::new(0.9, 0.9, 0.9, 0.9), 2.0);

    let mut storage = Storage::open(path_str).expect("reopen");
    let summary = storage
        .efficiency_summary("cli")
        .expect("summary")
        .expect("rows");
    assert_eq!(summary.steps, 20);
    assert_eq!(summary.final_efficiency, final_efficiency);

    let trajectory = storage.trajectory("cli", 1_000).expect("trajectory");
    assert_eq!(trajectory.len(), 20);
    assert_eq!(trajectory.first().map(|p| p.step), Some(0));
    assert_eq!(trajectory.last().map(|p| p.state), Some(final_state));

    // Optimizer iterations form a log and accumulate across runs.
    let improvements = storage.improvements("cli").expect("improvements");
    assert!(improvements.len() >= 2);

    drop(storage);
    let _ = fs::remove_file(path);
}
