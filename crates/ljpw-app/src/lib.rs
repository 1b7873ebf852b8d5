//! Shared application plumbing for the `ljpw` command-line driver.

use anyhow::{Context, Result};
use serde::Serialize;

pub mod cli;
pub mod render;
pub mod scenarios;

use cli::{Cli, Command};

fn emit<T: Serialize>(json: bool, report: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        let pretty = serde_json::to_string_pretty(report).context("failed to format report JSON")?;
        println!("{pretty}");
    } else {
        print!("{}", text(report));
    }
    Ok(())
}

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let Cli {
        config,
        seed,
        json,
        command,
    } = cli;

    match command {
        Command::Simulate(args) => {
            let config = scenarios::load_config(config.as_deref(), seed)?;
            let report =
                scenarios::simulate(config, args.state, args.duration, args.dt, &args.storage)?;
            emit(json, &report, render::simulation)
        }
        Command::Improve(args) => {
            let config = scenarios::load_config(config.as_deref(), seed)?;
            let report = scenarios::improve(
                config,
                args.state,
                args.iterations,
                args.learning_rate,
                &args.storage,
            )?;
            emit(json, &report, render::improvement)
        }
        Command::Explore(args) => {
            let report =
                scenarios::explore(seed, args.state, args.iterations, args.candidates)?;
            emit(json, &report, render::exploration)
        }
        Command::Inspire(args) => {
            let report = scenarios::inspire(seed, args.bases)?;
            emit(json, &report, render::inspiration)
        }
        Command::Profile { state } => {
            let report = scenarios::profile(state);
            emit(json, &report, render::profile)
        }
        Command::Demo => {
            let config = scenarios::load_config(config.as_deref(), seed)?;
            let report = scenarios::demo(config)?;
            emit(json, &report, render::demo)
        }
    }
}
