//! Balance operations.
//!
//! Every balance change is paired with exactly one ledger record in a single
//! atomic store call, then announced to the audit log. Business refusals
//! (unregistered user, insufficient funds) come back as a
//! [`MutationOutcome::Rejected`], never as an `Err`; an `Err` means storage
//! failed and nothing was applied.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::lock::AccountLocks;
use crate::domain::{
    AccountKey, ApplyResult, BalanceAccount, GuildId, MutationOutcome, MutationReceipt,
    NotificationStatus, Rejection, ResetPolicy, TransactionBuilder, TransactionRecord,
    TransactionSource, TransactionType, UserId,
};
use crate::error::Result;
use crate::port::outbound::notifier::color;
use crate::port::{AccountStore, AuditAction, AuditEvent, Delivery, Notifier};

/// Dollar amount with thousands separators and at most two decimals.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let text = amount.round_dp(2).normalize().to_string();
    let (int, frac) = match text.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (text.as_str(), None),
    };
    let (sign, digits) = match int.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", int),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match frac {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Audit wording for one applied entry.
struct Notice {
    title: &'static str,
    color: u32,
    description: String,
    message: String,
}

/// Balance and registration use cases.
pub struct TreasuryService<S> {
    store: Arc<S>,
    notifier: Arc<dyn Notifier>,
    locks: AccountLocks,
    reset_policy: ResetPolicy,
}

impl<S: AccountStore> TreasuryService<S> {
    pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>, reset_policy: ResetPolicy) -> Self {
        Self {
            store,
            notifier,
            locks: AccountLocks::new(),
            reset_policy,
        }
    }

    /// Current balance, or `None` for an unregistered user.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn balance(&self, key: &AccountKey) -> Result<Option<Decimal>> {
        Ok(self.store.load_balance(key).await?.map(|a| a.balance))
    }

    /// Registered accounts of a guild.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn accounts(&self, guild: &GuildId) -> Result<Vec<BalanceAccount>> {
        self.store.list_accounts(guild).await
    }

    /// Open a zero-balance account.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn register(&self, key: &AccountKey, operator: &UserId) -> Result<MutationOutcome> {
        let created = {
            let _guard = self.locks.lock(key).await;
            self.store.create_account(key).await?
        };
        if !created {
            return Ok(MutationOutcome::Rejected(Rejection::AlreadyRegistered));
        }
        info!(account = %key, operator = %operator, "Registered account");

        let notification = self
            .notify(AuditEvent {
                account: key.clone(),
                operator: Some(operator.clone()),
                action: AuditAction::Registered,
                title: "ATM - User Registered".to_string(),
                description: format!(
                    "Manager <@{operator}> has successfully registered <@{}>.",
                    key.user_id
                ),
                color: color::REGISTERED,
            })
            .await;
        Ok(applied(
            Decimal::ZERO,
            "User successfully registered.",
            notification,
            None,
        ))
    }

    /// Remove an account. Its ledger history is kept.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn unregister(&self, key: &AccountKey, operator: &UserId) -> Result<MutationOutcome> {
        let deleted = {
            let _guard = self.locks.lock(key).await;
            self.store.delete_account(key).await?
        };
        if !deleted {
            return Ok(MutationOutcome::Rejected(Rejection::AlreadyUnregistered));
        }
        info!(account = %key, operator = %operator, "Unregistered account");

        let notification = self
            .notify(AuditEvent {
                account: key.clone(),
                operator: Some(operator.clone()),
                action: AuditAction::Unregistered,
                title: "ATM - User Unregistered".to_string(),
                description: format!(
                    "Manager <@{operator}> has successfully unregistered <@{}>.",
                    key.user_id
                ),
                color: color::UNREGISTERED,
            })
            .await;
        Ok(applied(
            Decimal::ZERO,
            "User successfully unregistered.",
            notification,
            None,
        ))
    }

    /// Credit funds handed in by an operator.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn deposit(
        &self,
        key: &AccountKey,
        amount: Decimal,
        operator: &UserId,
    ) -> Result<MutationOutcome> {
        let builder =
            TransactionRecord::builder(key, TransactionType::Deposit, TransactionSource::Web, amount)
                .handled_by(operator.clone());
        self.apply(key, builder, |balance| Notice {
            title: "ATM - Deposit",
            color: color::CREDIT,
            description: format!(
                "Manager <@{operator}> successfully added **${}** to <@{}>.\nTheir new balance is now: **${}**.",
                format_money(amount),
                key.user_id,
                format_money(balance)
            ),
            message: format!("Deposited ${} to user.", format_money(amount)),
        })
        .await
    }

    /// Pay out funds through an operator.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn withdraw(
        &self,
        key: &AccountKey,
        amount: Decimal,
        operator: &UserId,
    ) -> Result<MutationOutcome> {
        let builder =
            TransactionRecord::builder(key, TransactionType::Withdraw, TransactionSource::Web, amount)
                .handled_by(operator.clone());
        self.apply(key, builder, |balance| Notice {
            title: "ATM - Withdraw",
            color: color::DEBIT,
            description: format!(
                "Manager <@{operator}> successfully removed **${}** from <@{}>.\nTheir new balance is now: **${}**.",
                format_money(amount),
                key.user_id,
                format_money(balance)
            ),
            message: format!("Withdrew ${} from user.", format_money(amount)),
        })
        .await
    }

    /// Credit a promotional bonus.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn bonus(
        &self,
        key: &AccountKey,
        amount: Decimal,
        operator: &UserId,
    ) -> Result<MutationOutcome> {
        let builder =
            TransactionRecord::builder(key, TransactionType::Bonus, TransactionSource::Web, amount)
                .handled_by(operator.clone());
        self.apply(key, builder, |balance| Notice {
            title: "ATM - Bonus Given",
            color: color::CREDIT,
            description: format!(
                "Manager <@{operator}> successfully given **${}** bonus to <@{}>.\nTheir new balance is now: **${}**.",
                format_money(amount),
                key.user_id,
                format_money(balance)
            ),
            message: format!("Bonus given ${} to user.", format_money(amount)),
        })
        .await
    }

    /// Debit a wager.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn place_bet(
        &self,
        key: &AccountKey,
        amount: Decimal,
        bet_id: &str,
    ) -> Result<MutationOutcome> {
        let builder =
            TransactionRecord::builder(key, TransactionType::Bet, TransactionSource::Casino, amount)
                .bet_id(bet_id);
        self.apply(key, builder, |balance| Notice {
            title: "Casino - Bet Placed",
            color: color::DEBIT,
            description: format!(
                "<@{}> wagered **${}** on bet `{bet_id}`.\nTheir new balance is now: **${}**.",
                key.user_id,
                format_money(amount),
                format_money(balance)
            ),
            message: format!("Bet of ${} placed.", format_money(amount)),
        })
        .await
    }

    /// Credit a winning payout for a settled bet.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn settle_win(
        &self,
        key: &AccountKey,
        amount: Decimal,
        bet_id: &str,
    ) -> Result<MutationOutcome> {
        let builder =
            TransactionRecord::builder(key, TransactionType::Win, TransactionSource::Casino, amount)
                .bet_id(bet_id);
        self.apply(key, builder, |balance| Notice {
            title: "Casino - Bet Won",
            color: color::CREDIT,
            description: format!(
                "<@{}> won **${}** on bet `{bet_id}`.\nTheir new balance is now: **${}**.",
                key.user_id,
                format_money(amount),
                format_money(balance)
            ),
            message: format!("Paid out ${} win.", format_money(amount)),
        })
        .await
    }

    /// Return a stake, e.g. for a cancelled prediction.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn refund(
        &self,
        key: &AccountKey,
        amount: Decimal,
        bet_id: &str,
    ) -> Result<MutationOutcome> {
        let builder =
            TransactionRecord::builder(key, TransactionType::Refund, TransactionSource::Casino, amount)
                .bet_id(bet_id);
        self.apply(key, builder, |balance| Notice {
            title: "Casino - Bet Refunded",
            color: color::CREDIT,
            description: format!(
                "<@{}> was refunded **${}** for bet `{bet_id}`.\nTheir new balance is now: **${}**.",
                key.user_id,
                format_money(amount),
                format_money(balance)
            ),
            message: format!("Refunded ${} to user.", format_money(amount)),
        })
        .await
    }

    /// Debit a VIP room purchase.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn purchase_vip(
        &self,
        key: &AccountKey,
        amount: Decimal,
        duration_days: u32,
    ) -> Result<MutationOutcome> {
        let builder =
            TransactionRecord::builder(key, TransactionType::Vip, TransactionSource::Command, amount)
                .meta("action", "purchase")
                .meta("durationDays", duration_days);
        self.apply(key, builder, |balance| Notice {
            title: "VIP - Room Purchased",
            color: color::DEBIT,
            description: format!(
                "<@{}> bought a VIP room for {duration_days} days at **${}**.\nTheir new balance is now: **${}**.",
                key.user_id,
                format_money(amount),
                format_money(balance)
            ),
            message: format!("VIP purchased for {duration_days} days."),
        })
        .await
    }

    /// Zero the balance. History handling follows the configured
    /// [`ResetPolicy`].
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn reset(&self, key: &AccountKey, operator: &UserId) -> Result<MutationOutcome> {
        let receipt = {
            let _guard = self.locks.lock(key).await;
            self.store
                .reset_account(key, self.reset_policy, operator)
                .await?
        };

        let Some(receipt) = receipt else {
            return Ok(MutationOutcome::Rejected(Rejection::NotRegistered));
        };
        info!(
            account = %key,
            operator = %operator,
            policy = ?self.reset_policy,
            previous = %receipt.previous_balance,
            purged = receipt.purged,
            "Reset balance"
        );

        let notification = self
            .notify(AuditEvent {
                account: key.clone(),
                operator: Some(operator.clone()),
                action: AuditAction::Reset,
                title: "ATM - Reset Balance".to_string(),
                description: format!(
                    "Manager <@{operator}> reset the balance of <@{}>.",
                    key.user_id
                ),
                color: color::RESET,
            })
            .await;
        Ok(applied(
            Decimal::ZERO,
            "User balance reset.",
            notification,
            receipt.adjustment,
        ))
    }

    async fn apply(
        &self,
        key: &AccountKey,
        builder: TransactionBuilder,
        notice: impl FnOnce(Decimal) -> Notice,
    ) -> Result<MutationOutcome> {
        let Ok(record) = builder.build() else {
            return Ok(MutationOutcome::Rejected(Rejection::InvalidAmount));
        };

        let result = {
            let _guard = self.locks.lock(key).await;
            self.store.apply_entry(key, &record).await?
        };

        let new_balance = match result {
            ApplyResult::Applied { new_balance } => new_balance,
            ApplyResult::NotFound => {
                return Ok(MutationOutcome::Rejected(Rejection::NotRegistered));
            }
            ApplyResult::InsufficientFunds { balance } => {
                info!(
                    account = %key,
                    kind = %record.kind,
                    balance = %balance,
                    requested = %record.amount,
                    "Refused debit: insufficient balance"
                );
                return Ok(MutationOutcome::Rejected(Rejection::InsufficientFunds {
                    balance,
                    requested: record.amount,
                }));
            }
        };

        info!(
            account = %key,
            kind = %record.kind,
            amount = %record.amount,
            new_balance = %new_balance,
            "Applied ledger entry"
        );

        let notice = notice(new_balance);
        let notification = self
            .notify(AuditEvent {
                account: key.clone(),
                operator: record.handled_by.clone(),
                action: AuditAction::Entry {
                    kind: record.kind,
                    amount: record.amount,
                    new_balance,
                },
                title: notice.title.to_string(),
                description: notice.description,
                color: notice.color,
            })
            .await;

        Ok(applied(
            new_balance,
            &notice.message,
            notification,
            Some(record),
        ))
    }

    async fn notify(&self, event: AuditEvent) -> NotificationStatus {
        match self.notifier.publish(&event).await {
            Ok(Delivery::Sent) => NotificationStatus::Delivered,
            Ok(Delivery::Skipped) => NotificationStatus::Skipped,
            Err(e) => {
                warn!(account = %event.account, error = %e, "Audit notification failed");
                NotificationStatus::Failed(e.to_string())
            }
        }
    }
}

fn applied(
    new_balance: Decimal,
    message: &str,
    notification: NotificationStatus,
    record: Option<TransactionRecord>,
) -> MutationOutcome {
    MutationOutcome::Applied(MutationReceipt {
        new_balance,
        message: message.to_string(),
        notification,
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::port::NullNotifier;
    use rust_decimal_macros::dec;

    fn service(policy: ResetPolicy) -> TreasuryService<MemoryStore> {
        TreasuryService::new(Arc::new(MemoryStore::new()), Arc::new(NullNotifier), policy)
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(dec!(1234567.5)), "1,234,567.5");
        assert_eq!(format_money(dec!(100)), "100");
        assert_eq!(format_money(dec!(0.129)), "0.13");
        assert_eq!(format_money(dec!(-1000)), "-1,000");
    }

    #[tokio::test]
    async fn unregistered_user_is_rejected() {
        let treasury = service(ResetPolicy::Purge);
        let outcome = treasury
            .deposit(&AccountKey::new("u1", "g1"), dec!(5), &UserId::new("m1"))
            .await
            .unwrap();
        assert_eq!(outcome.rejection(), Some(&Rejection::NotRegistered));
        assert_eq!(outcome.message(), "User not registered.");
        assert!(treasury.locks.is_empty());
    }

    #[tokio::test]
    async fn locks_are_released_after_each_operation() {
        let treasury = service(ResetPolicy::Adjust);
        let op = UserId::new("m1");
        for user in ["u1", "u2", "u3"] {
            let key = AccountKey::new(user, "g1");
            treasury.register(&key, &op).await.unwrap();
            treasury.deposit(&key, dec!(5), &op).await.unwrap();
            treasury.withdraw(&key, dec!(50), &op).await.unwrap();
            treasury.reset(&key, &op).await.unwrap();
            treasury.unregister(&key, &op).await.unwrap();
        }
        assert!(treasury.locks.is_empty());
    }

    #[tokio::test]
    async fn deposit_then_withdraw() {
        let treasury = service(ResetPolicy::Purge);
        let key = AccountKey::new("u1", "g1");
        let op = UserId::new("m1");
        assert!(treasury.register(&key, &op).await.unwrap().success());
        assert_eq!(
            treasury.register(&key, &op).await.unwrap().rejection(),
            Some(&Rejection::AlreadyRegistered)
        );

        let outcome = treasury.deposit(&key, dec!(50), &op).await.unwrap();
        assert_eq!(outcome.message(), "Deposited $50 to user.");
        assert_eq!(outcome.new_balance(), Some(dec!(50)));
        assert_eq!(
            outcome.record().and_then(|r| r.handled_by.clone()),
            Some(op.clone())
        );

        let outcome = treasury.withdraw(&key, dec!(20), &op).await.unwrap();
        assert_eq!(outcome.new_balance(), Some(dec!(30)));
        assert_eq!(treasury.balance(&key).await.unwrap(), Some(dec!(30)));
    }

    #[tokio::test]
    async fn zero_amount_is_invalid() {
        let treasury = service(ResetPolicy::Purge);
        let key = AccountKey::new("u1", "g1");
        treasury.register(&key, &UserId::new("m1")).await.unwrap();
        let outcome = treasury.bonus(&key, Decimal::ZERO, &UserId::new("m1")).await.unwrap();
        assert_eq!(outcome.rejection(), Some(&Rejection::InvalidAmount));
    }

    #[tokio::test]
    async fn vip_purchase_records_duration() {
        let treasury = service(ResetPolicy::Purge);
        let key = AccountKey::new("u1", "g1");
        let op = UserId::new("m1");
        treasury.register(&key, &op).await.unwrap();
        treasury.deposit(&key, dec!(100), &op).await.unwrap();

        let outcome = treasury.purchase_vip(&key, dec!(60), 7).await.unwrap();
        let record = outcome.record().unwrap();
        assert_eq!(record.kind, TransactionType::Vip);
        assert_eq!(record.meta["durationDays"], 7);
        assert_eq!(outcome.new_balance(), Some(dec!(40)));
    }

    #[tokio::test]
    async fn reset_on_missing_account() {
        let treasury = service(ResetPolicy::Adjust);
        let outcome = treasury
            .reset(&AccountKey::new("ghost", "g1"), &UserId::new("m1"))
            .await
            .unwrap();
        assert_eq!(outcome.rejection(), Some(&Rejection::NotRegistered));
    }
}
