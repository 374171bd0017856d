//! Configuration management for the post-processor.
//!
//! Handles:
//! - Command-line argument parsing
//! - Settings files (user-wide, then explicit), layered under the CLI flags

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::block::{standard_triggers, TriggerSpec, TriggerTable};
use crate::pipeline::ProcessOptions;
use crate::synth::SynthSettings;

pub const DEFAULT_OUTPUT_SUFFIX: &str = "postprocessed";

/// Diagnostic verbosity; errors are always reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// Command-line arguments for the post-processor
#[derive(Debug, Parser)]
#[command(name = "gcode-pp")]
#[command(about = "Prime tower temperature ramps and wipes for multi-tool G-code")]
#[command(version)]
pub struct Args {
    /// G-code file to process
    pub input: PathBuf,

    #[arg(
        short,
        long,
        help = "Output file (default: input with '.postprocessed' before the extension)"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Settings file (TOML)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Wipe feed rate in mm/min")]
    pub feed_override: Option<f64>,

    #[arg(long, help = "Drop temperature commands that change nothing")]
    pub minimize_temperatures: bool,

    /// Log level for diagnostics
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

/// One settings file; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub feed_override: Option<f64>,
    pub fast_feed_multiplier: Option<f64>,
    pub wipe_trailing_discard: Option<usize>,
    pub prime_dip: Option<f64>,
    pub output_suffix: Option<String>,
    pub minimize_temperatures: Option<bool>,
    /// Replaces the whole trigger table when present
    pub triggers: Option<Vec<TriggerSpec>>,
}

impl SettingsFile {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing settings {}", path.display()))
    }

    fn apply(self, config: &mut Config) {
        let synth = &mut config.synth;
        if let Some(v) = self.feed_override {
            synth.feed_override = v;
        }
        if let Some(v) = self.fast_feed_multiplier {
            synth.fast_feed_multiplier = v;
        }
        if let Some(v) = self.wipe_trailing_discard {
            synth.wipe_trailing_discard = v;
        }
        if let Some(v) = self.prime_dip {
            synth.prime_dip = v;
        }
        if let Some(v) = self.output_suffix {
            config.output_suffix = v;
        }
        if let Some(v) = self.minimize_temperatures {
            config.minimize_temperatures = v;
        }
        if let Some(v) = self.triggers {
            config.triggers = v;
        }
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    /// Explicit output path; derived from the input when absent
    pub output: Option<PathBuf>,
    pub synth: SynthSettings,
    pub output_suffix: String,
    pub minimize_temperatures: bool,
    pub triggers: Vec<TriggerSpec>,
    pub log_level: LogLevel,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments, reading the user
    /// settings file if there is one
    pub fn from_args(args: Args) -> Result<Self> {
        let mut layers = Vec::new();

        if let Some(path) = user_settings_path().filter(|p| p.is_file()) {
            log::debug!("Loading user settings from {}", path.display());
            layers.push(SettingsFile::load(&path)?);
        }
        if let Some(path) = &args.config {
            layers.push(SettingsFile::load(path)?);
        }

        Ok(Self::from_layers(args, layers))
    }

    /// Defaults, then each settings layer in order, then CLI flags
    pub fn from_layers(args: Args, layers: Vec<SettingsFile>) -> Self {
        let mut config = Config {
            input: args.input,
            output: args.output,
            synth: SynthSettings::default(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            minimize_temperatures: false,
            triggers: standard_triggers(),
            log_level: args.log_level,
        };

        for layer in layers {
            layer.apply(&mut config);
        }

        if let Some(feed) = args.feed_override {
            config.synth.feed_override = feed;
        }
        if args.minimize_temperatures {
            config.minimize_temperatures = true;
        }
        config
    }

    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => output_path(&self.input, &self.output_suffix),
        }
    }

    pub fn process_options(&self) -> Result<ProcessOptions> {
        let triggers = TriggerTable::new(&self.triggers).context("building trigger table")?;
        Ok(ProcessOptions {
            synth: self.synth.clone(),
            triggers,
            minimize_temperatures: self.minimize_temperatures,
        })
    }
}

/// `<config_dir>/gcode-pp/config.toml`
pub fn user_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gcode-pp").join("config.toml"))
}

/// `part.gcode` -> `part.<suffix>.gcode`
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{stem}.{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{suffix}"),
    };
    input.with_file_name(name)
}
