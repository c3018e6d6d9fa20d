//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// kmodtest -- build, load, test, and unload a kernel module.
///
/// Runs `run` when no subcommand is given.
#[derive(Parser, Debug)]
#[command(name = "kmodtest", version, about, long_about = None)]
pub struct Cli {
    /// Path to an optional kmodtest.toml configuration file.
    ///
    /// Without it the built-in defaults are used (module `mydevice`,
    /// test suite `./test_suite`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored transcript.
    Text,
    /// Transcript on stderr, machine-readable JSON report on stdout.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full workflow: clean, build, load, test, unload.
    Run(RunArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run the full test workflow.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Kernel module name (overrides `module.name`).
    #[arg(short, long)]
    pub module: Option<String>,

    /// Path to the test-suite binary (overrides `test_suite.path`).
    #[arg(short, long)]
    pub test_suite: Option<String>,
}

// ---- config ----

/// Manage kmodtest configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + defaults).
    Show {
        /// Show only a specific section (general, module, build, test_suite).
        #[arg(long)]
        section: Option<String>,
    },
}
