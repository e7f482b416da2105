//! Handler for the `account` command group.

use serde_json::json;
use tabled::{Table, Tabled};

use super::command::{AccountArgs, AccountCommand};
use super::context::Context;
use super::output;
use crate::domain::{AccountKey, GuildId, MutationOutcome, NotificationStatus, UserId};
use crate::error::Result;

fn key(args: &AccountArgs) -> AccountKey {
    AccountKey::new(args.user.as_str(), args.guild.as_str())
}

fn operator(args: &AccountArgs) -> UserId {
    UserId::new(args.operator.as_str())
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

/// Execute an `account` subcommand. Returns whether the operation was
/// applied; a refusal is reported but is not an error.
pub async fn execute(ctx: &Context, command: &AccountCommand) -> Result<bool> {
    let treasury = ctx.treasury();
    let outcome = match command {
        AccountCommand::Register(args) => treasury.register(&key(args), &operator(args)).await?,
        AccountCommand::Unregister(args) => {
            treasury.unregister(&key(args), &operator(args)).await?
        }
        AccountCommand::Deposit(args) => {
            treasury
                .deposit(&key(&args.account), args.amount, &operator(&args.account))
                .await?
        }
        AccountCommand::Withdraw(args) => {
            treasury
                .withdraw(&key(&args.account), args.amount, &operator(&args.account))
                .await?
        }
        AccountCommand::Bonus(args) => {
            treasury
                .bonus(&key(&args.account), args.amount, &operator(&args.account))
                .await?
        }
        AccountCommand::Reset(args) => treasury.reset(&key(args), &operator(args)).await?,
        AccountCommand::Bet(args) => {
            treasury
                .place_bet(&key(&args.account), args.amount, &args.bet_id)
                .await?
        }
        AccountCommand::Win(args) => {
            treasury
                .settle_win(&key(&args.account), args.amount, &args.bet_id)
                .await?
        }
        AccountCommand::Refund(args) => {
            treasury
                .refund(&key(&args.account), args.amount, &args.bet_id)
                .await?
        }
        AccountCommand::Vip {
            account,
            amount,
            days,
        } => treasury.purchase_vip(&key(account), *amount, *days).await?,
        AccountCommand::Balance(args) => {
            let balance = treasury.balance(&key(args)).await?;
            return Ok(print_balance(args, balance));
        }
        AccountCommand::List(args) => {
            list(ctx, &GuildId::new(args.guild.as_str())).await?;
            return Ok(true);
        }
    };

    print_outcome(&outcome);
    Ok(outcome.success())
}

fn print_outcome(outcome: &MutationOutcome) {
    if output::is_json() {
        output::json_output(json!({
            "command": "account",
            "success": outcome.success(),
            "message": outcome.message(),
            "outcome": outcome,
        }));
        return;
    }

    match outcome {
        MutationOutcome::Applied(receipt) => {
            output::success(&receipt.message);
            output::field("New balance", output::money(receipt.new_balance));
            if let Some(record) = &receipt.record {
                output::field("Transaction", output::muted(&record.id));
            }
            if let NotificationStatus::Failed(reason) = &receipt.notification {
                output::warning(&format!("Audit notification failed: {reason}"));
            }
        }
        MutationOutcome::Rejected(_) => output::error(outcome.message()),
    }
}

fn print_balance(args: &AccountArgs, balance: Option<rust_decimal::Decimal>) -> bool {
    if output::is_json() {
        output::json_output(json!({
            "command": "account.balance",
            "guild": args.guild,
            "user": args.user,
            "registered": balance.is_some(),
            "balance": balance,
        }));
        return balance.is_some();
    }

    match balance {
        Some(balance) => {
            output::field("Balance", output::money(balance));
            true
        }
        None => {
            output::error("User not registered.");
            false
        }
    }
}

async fn list(ctx: &Context, guild: &GuildId) -> Result<()> {
    let accounts = ctx.treasury().accounts(guild).await?;

    if output::is_json() {
        let accounts: Vec<_> = accounts
            .iter()
            .map(|a| {
                json!({
                    "user": a.key.user_id,
                    "balance": a.balance,
                    "createdAt": a.created_at,
                    "updatedAt": a.updated_at,
                })
            })
            .collect();
        output::json_output(json!({
            "command": "account.list",
            "guild": guild,
            "accounts": accounts,
        }));
        return Ok(());
    }

    output::section(&format!("Accounts: guild {guild}"));
    if accounts.is_empty() {
        output::note("(no registered users)");
        return Ok(());
    }
    let rows: Vec<AccountRow> = accounts
        .iter()
        .map(|a| AccountRow {
            user: a.key.user_id.to_string(),
            balance: output::money(a.balance),
            updated: a.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
