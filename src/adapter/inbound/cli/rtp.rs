//! Handlers for `rtp`, `preview` and `game`.

use serde_json::{json, Map, Value};
use tabled::{Table, Tabled};

use super::command::{GameCommand, PreviewArgs, RtpArgs};
use super::context::Context;
use super::output;
use crate::application::RtpReport;
use crate::domain::game::GameConfig;
use crate::domain::rtp::RtpResult;
use crate::domain::GuildId;
use crate::error::Result;

#[derive(Tabled)]
struct RtpRow {
    #[tabled(rename = "Game")]
    game: String,
    #[tabled(rename = "RTP")]
    rtp: String,
    #[tabled(rename = "House Edge")]
    edge: String,
}

fn rows(reports: &[RtpReport], ceiling: f64) -> Vec<RtpRow> {
    let mut rows = Vec::new();
    for report in reports {
        match &report.rtp {
            RtpResult::Single(value) => rows.push(RtpRow {
                game: report.name.to_string(),
                rtp: output::rtp_percent(*value, ceiling),
                edge: format!("{:.2}%", (1.0 - value) * 100.0),
            }),
            RtpResult::Breakdown(values) => {
                for (bet, value) in values {
                    rows.push(RtpRow {
                        game: format!("{} ({bet})", report.name),
                        rtp: output::rtp_percent(*value, ceiling),
                        edge: format!("{:.2}%", (1.0 - value) * 100.0),
                    });
                }
            }
        }
    }
    rows
}

fn report_json(report: &RtpReport) -> Result<Value> {
    let mut value = serde_json::to_value(report)?;
    if let Value::Object(map) = &mut value {
        map.insert(
            "percent".to_string(),
            serde_json::to_value(report.rtp.percent())?,
        );
    }
    Ok(value)
}

fn print_reports(title: &str, reports: &[RtpReport], ceiling: f64) {
    output::section(title);
    output::lines(&Table::new(rows(reports, ceiling)).to_string());
    for warning in reports.iter().filter_map(|r| r.warning.as_deref()) {
        output::warning(warning);
    }
}

/// Execute `rtp`.
pub async fn execute_rtp(ctx: &Context, args: &RtpArgs) -> Result<()> {
    let casino = ctx.casino();
    let mut reports = match &args.guild {
        Some(guild) => casino.guild_report(&GuildId::new(guild.as_str())).await?,
        None => casino.default_report(),
    };
    if let Some(game) = args.game {
        reports.retain(|r| r.game == game);
    }

    if output::is_json() {
        let games = reports.iter().map(report_json).collect::<Result<Vec<_>>>()?;
        output::json_output(json!({
            "command": "rtp",
            "guild": args.guild,
            "ceiling": ctx.config.casino.rtp_ceiling,
            "games": games,
        }));
        return Ok(());
    }

    let title = match &args.guild {
        Some(guild) => format!("Return to player: guild {guild}"),
        None => "Return to player: defaults".to_string(),
    };
    print_reports(&title, &reports, ctx.config.casino.rtp_ceiling);
    Ok(())
}

/// Form edits as the JSON object the preview expects.
fn edits_object(edits: &[(String, String)]) -> Value {
    let mut map = Map::new();
    for (field, raw) in edits {
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
        map.insert(field.clone(), value);
    }
    Value::Object(map)
}

/// Execute `preview`.
pub async fn execute_preview(ctx: &Context, args: &PreviewArgs) -> Result<()> {
    let edits = edits_object(&args.edits);
    let report = ctx
        .casino()
        .preview_config_change(&GuildId::new(args.guild.as_str()), args.game, &edits)
        .await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "preview",
            "guild": args.guild,
            "edits": edits,
            "report": report_json(&report)?,
        }));
        return Ok(());
    }

    print_reports(
        "Preview (not saved)",
        std::slice::from_ref(&report),
        ctx.config.casino.rtp_ceiling,
    );
    Ok(())
}

/// Execute `game show` / `game set`.
pub async fn execute_game(ctx: &Context, command: &GameCommand) -> Result<()> {
    match command {
        GameCommand::Show { guild, game } => {
            let settings = ctx.casino().settings(&GuildId::new(guild.as_str())).await?;
            let config = settings.get(*game);
            if output::is_json() {
                output::json_output(json!({
                    "command": "game.show",
                    "guild": guild,
                    "config": config,
                }));
            } else {
                output::section(game.display_name());
                output::lines(&serde_json::to_string_pretty(config)?);
            }
        }
        GameCommand::Set { guild, config_json } => {
            let config: GameConfig = serde_json::from_str(config_json)?;
            let report = ctx
                .casino()
                .save_config(&GuildId::new(guild.as_str()), &config)
                .await?;
            if output::is_json() {
                output::json_output(json!({
                    "command": "game.set",
                    "guild": guild,
                    "report": report_json(&report)?,
                }));
            } else {
                output::success(&format!("Saved {} configuration", report.name));
                print_reports(
                    "Return to player",
                    std::slice::from_ref(&report),
                    ctx.config.casino.rtp_ceiling,
                );
            }
        }
    }
    Ok(())
}
