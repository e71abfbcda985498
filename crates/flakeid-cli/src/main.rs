#![doc = include_str!("../README.md")]

mod cli;

use std::io::{BufWriter, Write};

use clap::Parser;
use cli::config::{AppConfig, CliArgs};

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = AppConfig::try_from(args)?;

    cli::telemetry::init_telemetry()?;
    tracing::debug!("Starting with config: {:#?}", config.generator);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    cli::commands::run(config, &mut out)?;
    out.flush()?;
    Ok(())
}
