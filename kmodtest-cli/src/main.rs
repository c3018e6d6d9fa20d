use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use kmodtest_core::config::GeneralConfig;

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use cli::{Cli, Commands, RunArgs};
use error::CliError;
use output::OutputWriter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<u8, CliError> {
    let writer = OutputWriter::new(cli.output);
    let config_path = cli.config.as_deref();

    // `config validate` reports load errors itself
    if let Some(Commands::Config(args)) = cli.command {
        let mut general = GeneralConfig::default();
        apply_log_overrides(&mut general, cli.log_level, cli.log_format);
        init_logging(&general)?;
        commands::config::execute(args, config_path, &writer)?;
        return Ok(0);
    }

    let mut config = commands::config::load_config(config_path)?;
    apply_log_overrides(&mut config.general, cli.log_level, cli.log_format);
    config.validate()?;
    init_logging(&config.general)?;

    tracing::debug!(
        config = %config_path.map(|p| p.display().to_string()).unwrap_or_default(),
        "kmodtest starting"
    );

    let args = match cli.command {
        Some(Commands::Run(args)) => args,
        _ => RunArgs::default(),
    };
    commands::run::execute(args, config, &writer)
}

fn apply_log_overrides(
    general: &mut GeneralConfig,
    log_level: Option<String>,
    log_format: Option<String>,
) {
    if let Some(level) = log_level {
        general.log_level = level;
    }
    if let Some(format) = log_format {
        general.log_format = format;
    }
}

fn init_logging(general: &GeneralConfig) -> Result<(), CliError> {
    logging::init_tracing(general).map_err(|e| CliError::Config(format!("{e:#}")))
}
