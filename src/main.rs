use std::process::ExitCode;

use clap::Parser;
use croupier::adapter::inbound::cli::command::Cli;
use croupier::adapter::inbound::cli::{output, run};
use tracing::{debug, error};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    run::configure_output(&cli);

    let (config, path) = match run::load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            output::error(&format!("Failed to load config: {e}"));
            return ExitCode::FAILURE;
        }
    };

    config.init_logging();
    run::banner();
    debug!(config = ?path, database = %config.database, "croupier starting");

    match run::execute(&cli, config, path.as_deref()).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
