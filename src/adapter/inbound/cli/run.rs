//! Command dispatch.

use std::path::Path;
use std::process::ExitCode;

use owo_colors::OwoColorize;

use super::command::{Cli, ColorChoice, Commands, ConfigCommand};
use super::context::{self, Context};
use super::output::{self, OutputConfig};
use super::{account, config, ledger, rtp};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Apply `--color`, `--json`, `--quiet` and `-v` before any output.
pub fn configure_output(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));
}

/// Raise the configured log level for each `-v`.
pub fn apply_verbosity(config: &mut Config) {
    match output::verbosity() {
        0 => {}
        1 => config.logging.level = "info".to_string(),
        2 => config.logging.level = "debug".to_string(),
        _ => config.logging.level = "trace".to_string(),
    }
}

/// Load the configuration named by `--config`, or the default one.
///
/// # Errors
/// Returns an error if the chosen file is unreadable or invalid.
pub fn load_config(cli: &Cli) -> Result<(Config, Option<std::path::PathBuf>)> {
    let (mut config, path) = context::load_config(cli.config.as_deref())?;
    apply_verbosity(&mut config);
    Ok((config, path))
}

/// Run the parsed command. Refused balance operations exit with status 2.
///
/// # Errors
/// Returns storage, parse or configuration errors.
pub async fn execute(cli: &Cli, config: Config, path: Option<&Path>) -> Result<ExitCode> {
    if let Commands::Config(command) = &cli.command {
        match command {
            ConfigCommand::Show => config::execute_show(&config, path)?,
            ConfigCommand::Check => config::execute_check(path)?,
        }
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = Context::open(config)?;
    match &cli.command {
        Commands::Rtp(args) => rtp::execute_rtp(&ctx, args).await?,
        Commands::Preview(args) => rtp::execute_preview(&ctx, args).await?,
        Commands::Game(command) => rtp::execute_game(&ctx, command).await?,
        Commands::Ledger(args) => ledger::execute_ledger(&ctx, args).await?,
        Commands::Profit(args) => ledger::execute_profit(&ctx, args).await?,
        Commands::Account(command) => {
            if !account::execute(&ctx, command).await? {
                return Ok(ExitCode::from(2));
            }
        }
        Commands::Config(_) => {}
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the version banner for interactive sessions.
pub fn banner() {
    if output::is_json() || output::is_quiet() || output::verbosity() == 0 {
        return;
    }
    output::header(env!("CARGO_PKG_VERSION"));
    output::note(&format!("{}", "casino economics engine".italic()));
}
