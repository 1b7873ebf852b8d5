//! Command-line surface for the `ljpw` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ljpw_core::StateVector;

#[derive(Parser, Debug)]
#[command(
    name = "ljpw",
    version,
    about = "Simulate, self-improve and explore LJPW state dynamics"
)]
pub struct Cli {
    /// JSON file holding an engine configuration; missing fields keep their defaults.
    #[arg(long, global = true, env = "LJPW_CONFIG")]
    pub config: Option<PathBuf>,

    /// RNG seed for reproducible runs (overrides the configuration file).
    #[arg(long, global = true, env = "LJPW_SEED")]
    pub seed: Option<u64>,

    /// Emit machine-readable JSON instead of a colored report.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Integrate the dynamics from a starting state.
    Simulate(SimulateArgs),
    /// Hill-climb the dynamic parameters with short rollouts.
    Improve(ImproveArgs),
    /// Walk the state space by repeated superposition and collapse.
    Explore(ExploreArgs),
    /// Build a high-entropy superposition, describe it and collapse it once.
    Inspire(InspireArgs),
    /// Print the musical profile of a state.
    Profile {
        /// State as `L,J,P,W`.
        #[arg(value_parser = parse_state)]
        state: StateVector,
    },
    /// Run the four reference scenarios back to back.
    Demo,
}

/// Optional DuckDB sink shared by the stepping commands.
#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// DuckDB file receiving every step and optimizer iteration.
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Run label used for rows written to `--db`.
    #[arg(long, default_value = "cli")]
    pub run: String,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Starting state as `L,J,P,W`.
    #[arg(long, value_parser = parse_state, default_value = "0.3,0.5,0.9,0.5")]
    pub state: StateVector,

    /// Simulated duration.
    #[arg(long, default_value_t = 10.0)]
    pub duration: f64,

    /// Integrator time step.
    #[arg(long, default_value_t = 0.1)]
    pub dt: f64,

    #[command(flatten)]
    pub storage: StorageArgs,
}

#[derive(Args, Debug)]
pub struct ImproveArgs {
    /// Starting state as `L,J,P,W`.
    #[arg(long, value_parser = parse_state, default_value = "0.5,0.5,0.5,0.5")]
    pub state: StateVector,

    #[arg(long, default_value_t = 20)]
    pub iterations: usize,

    /// Proportional mutation width.
    #[arg(long, default_value_t = 0.1)]
    pub learning_rate: f64,

    #[command(flatten)]
    pub storage: StorageArgs,
}

#[derive(Args, Debug)]
pub struct ExploreArgs {
    /// Starting state as `L,J,P,W`; defaults to the centre of the unit cube.
    #[arg(long, value_parser = parse_state)]
    pub state: Option<StateVector>,

    #[arg(long, default_value_t = 10)]
    pub iterations: usize,

    /// Candidates generated per round.
    #[arg(long, default_value_t = 5)]
    pub candidates: usize,
}

#[derive(Args, Debug)]
pub struct InspireArgs {
    /// Number of basis states in the superposition.
    #[arg(long, default_value_t = 4)]
    pub bases: usize,
}

/// Parse `L,J,P,W` into a state vector.
pub fn parse_state(raw: &str) -> Result<StateVector, String> {
    let values = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|err| format!("invalid component {part:?}: {err}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let values: [f64; 4] = values
        .try_into()
        .map_err(|values: Vec<f64>| format!("expected 4 components, got {}", values.len()))?;
    let state = StateVector::from_array(values);
    if !state.is_finite() {
        return Err("state components must be finite".to_string());
    }
    Ok(state)
}
