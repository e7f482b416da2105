//! Command-line interface definitions.
//!
//! Defines the `croupier` CLI using `clap`: RTP reports and previews for
//! game configurations, ledger browsing, balance operations and config
//! inspection.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crate::domain::game::GameKind;
use crate::domain::{TransactionSource, TransactionType};

/// Casino economics engine CLI
#[derive(Parser, Debug)]
#[command(name = "croupier")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output and log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the configuration file [default: croupier.toml if present]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the RTP of every game of a guild
    Rtp(RtpArgs),

    /// Preview the RTP of unsaved edits to a game configuration
    Preview(PreviewArgs),

    /// Inspect and change game configurations
    #[command(subcommand)]
    Game(GameCommand),

    /// Browse the transaction ledger
    Ledger(LedgerArgs),

    /// Net gaming result (wins minus bets) per user
    Profit(GuildArg),

    /// Balance operations
    #[command(subcommand)]
    Account(AccountCommand),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
pub struct GuildArg {
    /// Guild (server) identifier
    #[arg(short, long)]
    pub guild: String,
}

/// Arguments for `rtp`.
#[derive(Args, Debug)]
pub struct RtpArgs {
    /// Guild whose saved configuration to report; defaults when omitted
    #[arg(short, long)]
    pub guild: Option<String>,

    /// Report a single game
    #[arg(long, value_parser = parse_game)]
    pub game: Option<GameKind>,
}

/// Arguments for `preview`.
#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[arg(short, long)]
    pub guild: String,

    #[arg(long, value_parser = parse_game)]
    pub game: GameKind,

    /// Form edit as `field=value`; repeatable. Values are read as JSON when
    /// they parse, otherwise as text.
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_edit)]
    pub edits: Vec<(String, String)>,
}

/// Subcommands for `game`.
#[derive(Subcommand, Debug)]
pub enum GameCommand {
    /// Print a game's saved configuration as JSON
    Show {
        #[arg(short, long)]
        guild: String,
        #[arg(long, value_parser = parse_game)]
        game: GameKind,
    },
    /// Validate and save a configuration given as JSON
    Set {
        #[arg(short, long)]
        guild: String,
        /// Tagged configuration, e.g. `{"game":"dice","winMultiplier":5.5}`
        #[arg(long = "config-json", value_name = "JSON")]
        config_json: String,
    },
}

/// Summary backend for `ledger`.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum AggregatorChoice {
    /// Grouped counts and sums computed by the store
    #[default]
    Grouped,
    /// Load the selection and fold it in process
    Fold,
}

/// Arguments for `ledger`.
#[derive(Args, Debug)]
pub struct LedgerArgs {
    #[arg(short, long)]
    pub guild: String,

    /// 1-indexed page number
    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub page_size: Option<u32>,

    /// Substring of the user id
    #[arg(long)]
    pub user: Option<String>,

    /// Substring of the handling operator id or bet id
    #[arg(long)]
    pub admin: Option<String>,

    /// Restrict to a transaction type; repeatable
    #[arg(long = "type", value_name = "TYPE")]
    pub types: Vec<TransactionType>,

    /// Restrict to a transaction source; repeatable
    #[arg(long = "source", value_name = "SOURCE")]
    pub sources: Vec<TransactionSource>,

    /// First day, `YYYY-MM-DD`
    #[arg(long)]
    pub from: Option<String>,

    /// Last day, `YYYY-MM-DD`
    #[arg(long)]
    pub to: Option<String>,

    /// Comma-separated `field:direction` pairs, e.g. `amount:desc,type:asc`
    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long, value_enum, default_value_t = AggregatorChoice::default())]
    pub aggregator: AggregatorChoice,
}

/// Target account plus the acting operator.
#[derive(Args, Debug)]
pub struct AccountArgs {
    #[arg(short, long)]
    pub guild: String,

    #[arg(short, long)]
    pub user: String,

    /// Operator performing the change
    #[arg(long, default_value = "system")]
    pub operator: String,
}

#[derive(Args, Debug)]
pub struct AmountArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    #[arg(long)]
    pub amount: Decimal,
}

#[derive(Args, Debug)]
pub struct BetArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    #[arg(long)]
    pub amount: Decimal,

    #[arg(long)]
    pub bet_id: String,
}

/// Subcommands for `account`.
#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// Open a zero-balance account
    Register(AccountArgs),
    /// Remove an account, keeping its history
    Unregister(AccountArgs),
    /// Credit operator-handled funds
    Deposit(AmountArgs),
    /// Debit operator-handled funds
    Withdraw(AmountArgs),
    /// Credit a promotional bonus
    Bonus(AmountArgs),
    /// Zero the balance
    Reset(AccountArgs),
    /// Debit a wager
    Bet(BetArgs),
    /// Credit a winning payout
    Win(BetArgs),
    /// Return a stake
    Refund(BetArgs),
    /// Buy a VIP room
    Vip {
        #[command(flatten)]
        account: AccountArgs,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Show one balance
    Balance(AccountArgs),
    /// List the accounts of a guild
    List(GuildArg),
}

/// Subcommands for `config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied
    Show,
    /// Validate the configuration file
    Check,
}

fn parse_game(s: &str) -> Result<GameKind, String> {
    GameKind::parse(s).map_err(|e| e.to_string())
}

fn parse_edit(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got `{s}`"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err("field name is empty".to_string());
    }
    Ok((field.to_string(), value.to_string()))
}
