//! Handlers for `ledger` and `profit`.

use serde_json::json;
use tabled::{Table, Tabled};

use super::command::{AggregatorChoice, GuildArg, LedgerArgs};
use super::context::Context;
use super::output;
use crate::application::{
    FoldAggregator, GroupedAggregator, LedgerAggregator, LedgerPage, LedgerService,
};
use crate::domain::query::LedgerCriteria;
use crate::domain::{GuildId, LedgerSummary, TransactionRecord};
use crate::error::Result;

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Handled By")]
    handled_by: String,
    #[tabled(rename = "Bet")]
    bet_id: String,
}

impl From<&TransactionRecord> for RecordRow {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            date: record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            user: record.user_id.to_string(),
            kind: record.kind.to_string(),
            source: record.source.to_string(),
            amount: output::money(record.balance_delta()),
            handled_by: record
                .handled_by
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            bet_id: record.bet_id.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn criteria(args: &LedgerArgs) -> LedgerCriteria {
    let mut criteria = LedgerCriteria::new(args.guild.as_str());
    criteria.page = args.page;
    criteria.page_size = args.page_size;
    criteria.user_search = args.user.clone();
    criteria.admin_search = args.admin.clone();
    criteria.types = args.types.clone();
    criteria.sources = args.sources.clone();
    criteria.date_from = args.from.clone();
    criteria.date_to = args.to.clone();
    criteria.sort = args.sort.clone();
    criteria
}

async fn query<A: LedgerAggregator>(
    ctx: &Context,
    aggregator: A,
    criteria: &LedgerCriteria,
) -> Result<LedgerPage> {
    LedgerService::new(ctx.store.clone(), aggregator, ctx.query_defaults())
        .query_ledger(criteria)
        .await
}

fn print_summary(summary: &LedgerSummary) {
    output::section("Summary");
    output::field("Transactions", summary.total);
    output::field(
        "Cash flow",
        format!(
            "{} {}",
            output::money(summary.cash_flow),
            output::muted(summary.cash_flow_formula())
        ),
    );
    output::field(
        "Game P&L",
        format!(
            "{} {}",
            output::money(summary.game_pnl),
            output::muted(summary.pnl_formula())
        ),
    );

    output::section("By type");
    for (kind, count) in summary.counts_by_type.iter().filter(|(_, c)| **c > 0) {
        output::field(kind.as_str(), count);
    }
    output::section("By source");
    for (source, count) in summary.counts_by_source.iter().filter(|(_, c)| **c > 0) {
        output::field(source.as_str(), count);
    }
}

/// Execute `ledger`.
pub async fn execute_ledger(ctx: &Context, args: &LedgerArgs) -> Result<()> {
    let criteria = criteria(args);
    let page = match args.aggregator {
        AggregatorChoice::Grouped => {
            query(ctx, GroupedAggregator::new(ctx.store.clone()), &criteria).await?
        }
        AggregatorChoice::Fold => {
            query(ctx, FoldAggregator::new(ctx.store.clone()), &criteria).await?
        }
    };

    if output::is_json() {
        output::json_output(json!({
            "command": "ledger",
            "guild": args.guild,
            "result": page,
        }));
        return Ok(());
    }

    output::section(&format!(
        "Ledger: guild {} (page {} of {}, {} records)",
        args.guild,
        page.page,
        page.page_count().max(1),
        page.total_count
    ));
    if page.records.is_empty() {
        output::note("(no transactions match)");
    } else {
        let rows: Vec<RecordRow> = page.records.iter().map(RecordRow::from).collect();
        output::lines(&Table::new(rows).to_string());
    }
    print_summary(&page.summary);
    Ok(())
}

#[derive(Tabled)]
struct ProfitRow {
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Net")]
    net: String,
}

/// Execute `profit`.
pub async fn execute_profit(ctx: &Context, args: &GuildArg) -> Result<()> {
    let service = LedgerService::new(
        ctx.store.clone(),
        GroupedAggregator::new(ctx.store.clone()),
        ctx.query_defaults(),
    );
    let profits = service
        .net_profit_by_user(&GuildId::new(args.guild.as_str()))
        .await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "profit",
            "guild": args.guild,
            "users": profits,
        }));
        return Ok(());
    }

    output::section(&format!("Net gaming result: guild {}", args.guild));
    if profits.is_empty() {
        output::note("(no bets or wins recorded)");
        return Ok(());
    }
    let rows: Vec<ProfitRow> = profits
        .iter()
        .map(|(user, net)| ProfitRow {
            user: user.to_string(),
            net: output::money(*net),
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
