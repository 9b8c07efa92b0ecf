// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tfsweep`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tfsweep",
    version,
    about = "Run terraform checks (fmt, init, validate and tflint) across a tree.",
    long_about = None
)]
pub struct CliArgs {
    /// Root directory to scan for terraform directories.
    #[arg(value_name = "DIRECTORY", default_value = ".")]
    pub root: PathBuf,

    /// Limit the number of directories checked in parallel.
    ///
    /// Defaults to all of them when stdout is a terminal, and 1 otherwise.
    #[arg(long, short = 'p', value_name = "N")]
    pub max_in_parallel: Option<usize>,

    /// Optional config file passed to tflint.
    #[arg(long, value_name = "PATH")]
    pub tflint_config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TFSWEEP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
