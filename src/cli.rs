//! Binary entry point logic

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;

use crate::config::{Args, Config};
use crate::pipeline::{process_lines, render_output};

/// Parse arguments, set up logging and process one file
pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.filter());
    run_with(Config::from_args(args)?)
}

/// `RUST_LOG` wins over `level`
pub fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .init();
}

pub fn run_with(config: Config) -> Result<()> {
    let options = config.process_options()?;
    let input = fs::read_to_string(&config.input)
        .with_context(|| format!("reading {}", config.input.display()))?;

    info!("Processing {}", config.input.display());
    let lines = process_lines(input.lines(), &options)
        .with_context(|| format!("processing {}", config.input.display()))?;

    let output = config.output_path();
    fs::write(&output, render_output(&lines))
        .with_context(|| format!("writing {}", output.display()))?;
    info!("Wrote {} lines to {}", lines.len(), output.display());
    Ok(())
}
