//! Scenario runners backing each subcommand. Every runner returns a serializable report.

use std::path::Path;

use anyhow::{Context, Result};
use ljpw_core::{
    BasisSummary, CreativityConfig, CreativityEngine, Dimension, DynamicParameters, Engine,
    EngineConfig, ImprovementReport, Phase, StateVector,
};
use ljpw_semantics::{MusicalProfile, MusicalSemanticsAnalyzer};
use ljpw_storage::{EfficiencySummary, Storage};
use serde::Serialize;
use tracing::info;

use crate::cli::StorageArgs;

/// Load the engine configuration, applying the seed override.
pub fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_json::from_str::<EngineConfig>(&data)
                .with_context(|| format!("config file {} is not valid JSON", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if seed.is_some() {
        config.rng_seed = seed;
    }
    config.validate().context("invalid engine configuration")?;
    Ok(config)
}

fn db_path(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("database path {} is not valid UTF-8", path.display()))
}

fn build_engine(state: StateVector, config: EngineConfig, storage: &StorageArgs) -> Result<Engine> {
    let engine = match &storage.db {
        Some(path) => {
            let sink = Storage::open(db_path(path)?)
                .with_context(|| format!("failed to open database {}", path.display()))?
                .with_run(storage.run.clone())
                .context("failed to select storage run")?;
            info!(db = %path.display(), run = %storage.run, "persisting steps to DuckDB");
            Engine::with_sink(state, config, Box::new(sink))?
        }
        None => Engine::new(state, config)?,
    };
    Ok(engine)
}

/// Reopen the database after the engine (and its sink) has been dropped.
fn stored_summary(storage: &StorageArgs) -> Result<Option<EfficiencySummary>> {
    let Some(path) = &storage.db else {
        return Ok(None);
    };
    let mut db = Storage::open(db_path(path)?)
        .with_context(|| format!("failed to reopen database {}", path.display()))?;
    Ok(db.efficiency_summary(&storage.run)?)
}

#[derive(Debug, Clone, Serialize)]
pub struct StateReport {
    pub state: StateVector,
    pub harmony: f64,
    pub phase: Phase,
    pub dominant: Dimension,
    pub efficiency: f64,
    pub consciousness: f64,
    pub semantic_entropy: f64,
    pub information_density: f64,
}

impl StateReport {
    #[must_use]
    pub fn of(state: StateVector) -> Self {
        Self {
            state,
            harmony: state.harmony(),
            phase: state.phase(),
            dominant: state.dominant_dimension().0,
            efficiency: state.efficiency(),
            consciousness: state.consciousness(),
            semantic_entropy: state.semantic_entropy(),
            information_density: state.information_density(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub initial: StateReport,
    pub final_state: StateReport,
    pub steps: u64,
    pub time: f64,
    pub best_efficiency: Option<f64>,
    pub converged: bool,
    pub stored: Option<EfficiencySummary>,
}

pub fn simulate(
    config: EngineConfig,
    state: StateVector,
    duration: f64,
    dt: f64,
    storage: &StorageArgs,
) -> Result<SimulationReport> {
    let mut engine = build_engine(state, config, storage)?;
    engine
        .simulate(duration, dt)
        .context("simulation rejected its inputs")?;
    let report = SimulationReport {
        initial: StateReport::of(state),
        final_state: StateReport::of(engine.state()),
        steps: engine.steps(),
        time: engine.time(),
        best_efficiency: engine.self_model().best_efficiency,
        converged: engine.is_converged(),
        stored: None,
    };
    drop(engine);
    Ok(SimulationReport {
        stored: stored_summary(storage)?,
        ..report
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ImprovementOutput {
    pub state: StateReport,
    pub learning_rate: f64,
    pub parameters_before: DynamicParameters,
    pub report: ImprovementReport,
}

pub fn improve(
    config: EngineConfig,
    state: StateVector,
    iterations: usize,
    learning_rate: f64,
    storage: &StorageArgs,
) -> Result<ImprovementOutput> {
    let mut engine = build_engine(state, config, storage)?;
    let parameters_before = *engine.params();
    let report = engine
        .self_improve(iterations, learning_rate)
        .context("self-improvement rejected its inputs")?;
    Ok(ImprovementOutput {
        state: StateReport::of(engine.state()),
        learning_rate,
        parameters_before,
        report,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplorationReport {
    pub start: Option<StateVector>,
    pub trajectory: Vec<StateReport>,
}

pub fn explore(
    seed: Option<u64>,
    start: Option<StateVector>,
    iterations: usize,
    candidates: usize,
) -> Result<ExplorationReport> {
    let mut creativity = CreativityEngine::new(CreativityConfig {
        candidates,
        rng_seed: seed,
        ..CreativityConfig::default()
    })?;
    let trajectory = creativity.iterative_exploration(start, iterations)?;
    Ok(ExplorationReport {
        start,
        trajectory: trajectory.into_iter().map(StateReport::of).collect(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct InspirationReport {
    pub bases: Vec<BasisSummary>,
    pub entanglement_entropy: f64,
    pub collapsed: StateReport,
    pub profile: MusicalProfile,
}

pub fn inspire(seed: Option<u64>, bases: usize) -> Result<InspirationReport> {
    let mut creativity = CreativityEngine::new(CreativityConfig {
        rng_seed: seed,
        ..CreativityConfig::default()
    })?;
    let psi = CreativityEngine::high_entropy_superposition(bases)?;
    let collapsed = psi.collapse(true, creativity.rng());
    Ok(InspirationReport {
        bases: psi.describe(),
        entanglement_entropy: psi.entanglement_entropy(),
        collapsed: StateReport::of(collapsed),
        profile: MusicalSemanticsAnalyzer::new().profile(&collapsed),
    })
}

#[must_use]
pub fn profile(state: StateVector) -> MusicalProfile {
    MusicalSemanticsAnalyzer::new().profile(&state)
}

#[derive(Debug, Clone, Serialize)]
pub struct EquilibriumScenario {
    pub final_harmony: f64,
    /// Population variance of the last five efficiency samples.
    pub tail_variance: f64,
    pub stable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoveryScenario {
    pub start: StateVector,
    pub end: StateVector,
}

#[derive(Debug, Clone, Serialize)]
pub struct InertiaScenario {
    pub end: StateVector,
    pub love_power_ratio: f64,
    pub inertia_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub equilibrium: EquilibriumScenario,
    pub recovery: RecoveryScenario,
    pub improvement: ImprovementReport,
    pub inertia: InertiaScenario,
}

fn tail_variance(values: &[f64], window: usize) -> f64 {
    let tail = &values[values.len().saturating_sub(window)..];
    if tail.is_empty() {
        return 0.0;
    }
    let n = tail.len() as f64;
    let mean = tail.iter().sum::<f64>() / n;
    tail.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

/// The four reference scenarios: equilibrium, recovery, self-improvement and inertia.
pub fn demo(config: EngineConfig) -> Result<DemoReport> {
    let mut stable = Engine::new(StateVector::EQUILIBRIUM, config.clone())?;
    stable.simulate(5.0, 0.1)?;
    let variance = tail_variance(&stable.efficiency_trend(), 5);
    let equilibrium = EquilibriumScenario {
        final_harmony: stable.harmony(),
        tail_variance: variance,
        stable: variance < 1e-3,
    };

    let imbalanced = StateVector::new(0.3, 0.5, 0.9, 0.5);
    let mut recovering = Engine::new(imbalanced, config.clone())?;
    recovering.simulate(10.0, 0.1)?;
    let recovery = RecoveryScenario {
        start: imbalanced,
        end: recovering.state(),
    };

    let mut learning = Engine::new(StateVector::new(0.5, 0.5, 0.5, 0.5), config.clone())?;
    let improvement = learning.self_improve(20, 0.1)?;

    let inertia_config = config.inertia;
    let mut inertia = Engine::new(StateVector::new(0.4, 0.5, 0.4, 0.5), config)?;
    inertia.simulate(5.0, 0.1)?;
    let end = inertia.state();
    let inertia = InertiaScenario {
        end,
        love_power_ratio: end.l / end.p,
        inertia_ratio: inertia_config.power / inertia_config.love,
    };

    Ok(DemoReport {
        equilibrium,
        recovery,
        improvement,
        inertia,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> EngineConfig {
        EngineConfig {
            rng_seed: Some(0xDEADBEEF),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn tail_variance_handles_short_series() {
        assert_eq!(tail_variance(&[], 5), 0.0);
        assert_eq!(tail_variance(&[1.0, 1.0], 5), 0.0);
        assert_eq!(tail_variance(&[9.0, 1.0, 2.0, 3.0, 4.0, 5.0], 5), 2.0);
    }

    #[test]
    fn seed_overrides_config() {
        let config = load_config(None, Some(5)).expect("config");
        assert_eq!(config.rng_seed, Some(5));
        assert_eq!(load_config(None, None).expect("config").rng_seed, None);
    }

    #[test]
    fn simulate_without_storage_reports_steps() {
        let storage = StorageArgs {
            db: None,
            run: "test".into(),
        };
        let report = simulate(seeded(), StateVector::new(0.3, 0.5, 0.9, 0.5), 2.0, 0.1, &storage)
            .expect("simulate");
        assert_eq!(report.steps, 20);
        assert!(report.stored.is_none());
        assert!(report.final_state.state.is_finite());
    }

    #[test]
    fn demo_runs_every_scenario() {
        let report = demo(seeded()).expect("demo");
        assert_eq!(report.improvement.iterations.len(), 20);
        assert!((report.inertia.inertia_ratio - 2.618 / 0.236).abs() < 1e-12);
        assert!(report.recovery.end.is_finite());
    }

    #[test]
    fn inspire_collapses_to_an_archetype() {
        let report = inspire(Some(3), 4).expect("inspire");
        assert_eq!(report.bases.len(), 4);
        assert!(
            ljpw_core::ARCHETYPES
                .iter()
                .any(|(_, state)| *state == report.collapsed.state)
        );
        assert!((report.entanglement_entropy - 1.0).abs() < 1e-12);
    }
}
