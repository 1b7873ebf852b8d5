use anyhow::Result;
use clap::Parser;
use ljpw_app::cli::Cli;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    info!(command = ?cli.command, "starting ljpw");
    ljpw_app::run(cli)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
