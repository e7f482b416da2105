//! Handler for the `config` command group.

use std::path::Path;

use serde_json::json;

use super::output;
use crate::error::Result;
use crate::infrastructure::config::settings::{Config, DATABASE_ENV};

fn source_label(path: Option<&Path>) -> String {
    path.map_or_else(
        || "(built-in defaults)".to_string(),
        |p| p.display().to_string(),
    )
}

/// Execute `config show`.
pub fn execute_show(config: &Config, path: Option<&Path>) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({
            "command": "config.show",
            "source": source_label(path),
            "config": config,
        }));
        return Ok(());
    }

    output::section("Effective Configuration");
    output::field("Source", source_label(path));
    output::field("Database", &config.database);
    if std::env::var_os(DATABASE_ENV).is_some() {
        output::note(&format!("database overridden by {DATABASE_ENV}"));
    }

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", &config.logging.format);

    output::section("Casino");
    output::field(
        "RTP ceiling",
        format!("{:.2}%", config.casino.rtp_ceiling * 100.0),
    );

    output::section("Ledger");
    output::field("Page size", config.ledger.default_page_size);
    output::field("Max page size", config.ledger.max_page_size);
    output::field("UTC offset", config.ledger.utc_offset());
    output::field("Reset policy", format!("{:?}", config.ledger.reset_policy).to_lowercase());

    output::section("Notifications");
    output::field(
        "Audit log",
        if config.notifications.audit_log {
            "enabled"
        } else {
            "disabled"
        },
    );
    Ok(())
}

/// Execute `config check`. Loading already validated the file, so reaching
/// this point means it is valid.
pub fn execute_check(path: Option<&Path>) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({
            "command": "config.check",
            "source": source_label(path),
            "valid": true,
        }));
        return Ok(());
    }

    match path {
        Some(path) => output::success(&format!("{} is valid", path.display())),
        None => {
            output::success("No config file found; built-in defaults are valid");
            output::hint(&format!(
                "create {} or pass {}",
                output::highlight(super::context::DEFAULT_CONFIG_FILE),
                output::highlight("--config <path>")
            ));
        }
    }
    Ok(())
}
