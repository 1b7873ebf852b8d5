use std::sync::{Arc, Mutex};

use ljpw_core::{
    CreativityConfig, CreativityEngine, Engine, EngineConfig, ImprovementReport,
    IterationOutcome, Phase, QuantumSuperposition, StateVector, StepRecord, StepSink,
};
use num_complex::Complex64;
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn seeded_config(seed: u64) -> EngineConfig {
    EngineConfig {
        rng_seed: Some(seed),
        ..EngineConfig::default()
    }
}

#[derive(Default)]
struct SpySink {
    steps: Arc<Mutex<Vec<StepRecord>>>,
    improvements: Arc<Mutex<Vec<IterationOutcome>>>,
}

impl StepSink for SpySink {
    fn on_step(&mut self, record: &StepRecord) {
        self.steps.lock().expect("steps").push(*record);
    }

    fn on_improvement(&mut self, outcome: &IterationOutcome) {
        self.improvements.lock().expect("improvements").push(*outcome);
    }
}

#[test]
fn hundred_steps_from_imbalanced_start_stay_finite() {
    let mut engine = Engine::new(
        StateVector::new(0.3, 0.5, 0.9, 0.5),
        seeded_config(0xDEADBEEF),
    )
    .expect("engine");
    for _ in 0..100 {
        engine.step(0.1);
    }
    let trend = engine.efficiency_trend();
    assert_eq!(trend.len(), 100);
    assert!(trend.iter().all(|v| v.is_finite()));
    for record in engine.history().iter() {
        assert!(record.state.is_finite());
        assert!(record.entropy.is_finite());
        assert!(record.entropy_production.is_finite());
        assert!(record.harmony > 0.0 && record.harmony <= 1.0);
        assert_eq!(record.phase, Phase::classify(record.harmony, record.state.l));
    }
    assert!((engine.time() - 10.0).abs() < 1e-9);
}

#[test]
fn per_step_change_respects_acceleration_clip() {
    let mut engine = Engine::new(
        StateVector::new(0.05, 0.95, 0.05, 0.95),
        seeded_config(1),
    )
    .expect("engine");
    for dt in [0.01, 0.1, 0.25, 1.0] {
        for _ in 0..20 {
            let before = engine.state();
            let record = engine.step(dt);
            for (a, b) in before.to_array().iter().zip(record.state.to_array()) {
                assert!((b - a).abs() <= 0.05 * dt + 1e-12);
            }
        }
    }
}

#[test]
fn self_improve_best_score_is_monotone() {
    let mut engine = Engine::new(
        StateVector::new(0.3, 0.5, 0.9, 0.5),
        seeded_config(0xDEADBEEF),
    )
    .expect("engine");
    let report: ImprovementReport = engine.self_improve(5, 0.05).expect("improve");
    assert_eq!(report.iterations.len(), 5);
    let mut best = report.initial_score;
    for outcome in &report.iterations {
        assert!(outcome.best_score >= best);
        best = outcome.best_score;
    }
    assert!(report.improvement() >= 0.0);
    assert!(!report.stopped_early);
}

#[test]
fn seeded_runs_are_reproducible() {
    let run = |seed: u64| {
        let mut engine =
            Engine::new(StateVector::new(0.3, 0.5, 0.9, 0.5), seeded_config(seed)).expect("engine");
        let report = engine.self_improve(10, 0.1).expect("improve");
        engine.simulate(5.0, 0.1).expect("simulate");
        (report, engine.history().states())
    };
    let (report_a, states_a) = run(42);
    let (report_b, states_b) = run(42);
    assert_eq!(report_a, report_b);
    assert_eq!(states_a, states_b);
}

#[test]
fn sink_receives_steps_and_improvements() {
    let spy = SpySink::default();
    let steps = Arc::clone(&spy.steps);
    let improvements = Arc::clone(&spy.improvements);
    let mut engine = Engine::with_sink(
        StateVector::new(0.3, 0.5, 0.9, 0.5),
        seeded_config(7),
        Box::new(spy),
    )
    .expect("engine");
    engine.simulate(1.0, 0.1).expect("simulate");
    engine.self_improve(4, 0.05).expect("improve");

    let steps = steps.lock().expect("steps");
    assert_eq!(steps.len(), 10);
    assert_eq!(steps.first().map(|r| r.index), Some(0));
    assert_eq!(steps.last(), engine.history().latest());
    assert_eq!(improvements.lock().expect("improvements").len(), 4);
}

#[test]
fn bounded_history_keeps_latest_records() {
    let config = EngineConfig {
        history_capacity: Some(16),
        ..seeded_config(3)
    };
    let mut engine = Engine::new(StateVector::EQUILIBRIUM, config).expect("engine");
    engine.simulate(10.0, 0.1).expect("simulate");
    assert_eq!(engine.history().len(), 16);
    assert_eq!(engine.history().total_recorded(), 100);
    assert_eq!(engine.history().latest().map(|r| r.index), Some(99));
    assert_eq!(engine.self_model().steps, 100);
}

#[test]
fn collapse_result_reseeds_simulation() {
    let mut rng = SmallRng::seed_from_u64(0xDEADBEEF);
    let psi = CreativityEngine::high_entropy_superposition(4).expect("psi");
    let chosen = psi.collapse(true, &mut rng);
    assert!(psi.basis().contains(&chosen));

    let mut engine = Engine::new(StateVector::EQUILIBRIUM, seeded_config(5)).expect("engine");
    engine.set_state(chosen);
    let record = engine.step(0.1);
    assert!(chosen.distance(&record.state) <= 0.05 * 0.1 * 2.0 + 1e-12);
}

#[test]
fn zero_amplitude_collapse_is_roughly_uniform() {
    let basis: Vec<StateVector> = (0..5)
        .map(|i| StateVector::new(0.1 * i as f64, 0.5, 0.5, 0.5))
        .collect();
    let psi = QuantumSuperposition::new(vec![Complex64::new(0.0, 0.0); 5], basis.clone())
        .expect("psi");
    let mut rng = SmallRng::seed_from_u64(11);
    let mut counts = [0usize; 5];
    for _ in 0..10_000 {
        let picked = psi.collapse(false, &mut rng);
        let index = basis.iter().position(|s| *s == picked).expect("member");
        counts[index] += 1;
    }
    for count in counts {
        assert!((1_700..=2_300).contains(&count), "count {count}");
    }
}

#[test]
fn exploration_feeds_engine() {
    let mut creativity = CreativityEngine::new(CreativityConfig {
        rng_seed: Some(21),
        ..CreativityConfig::default()
    })
    .expect("creativity");
    let trajectory = creativity.iterative_exploration(None, 10).expect("explore");
    let last = *trajectory.last().expect("last");
    let mut engine = Engine::new(last, seeded_config(21)).expect("engine");
    let history = engine.simulate(2.0, 0.1).expect("simulate");
    assert_eq!(history.len(), 20);
}
