use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tankstrike_agent::agent;
use tankstrike_agent::config::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();

    agent::run(cli.into_config())
}
