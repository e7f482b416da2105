//! Notifier port for audit events.
//!
//! Every applied balance mutation is announced to the guild's audit log.
//! Delivery is best effort: a failed notification never undoes the
//! mutation, it only marks the outcome as partial.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::{AccountKey, TransactionType, UserId};
use crate::error::NotifyError;

/// Embed colors used by the audit log.
pub mod color {
    pub const CREDIT: u32 = 0x57_f2_87;
    pub const REGISTERED: u32 = 0x95_a5_a6;
    pub const UNREGISTERED: u32 = 0x23_27_2a;
    pub const RESET: u32 = 0x1a_bc_9c;
    pub const DEBIT: u32 = 0xed_42_45;
}

/// What happened, for structured consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditAction {
    Registered,
    Unregistered,
    Reset,
    Entry {
        kind: TransactionType,
        amount: Decimal,
        new_balance: Decimal,
    },
}

/// An audit-log message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub account: AccountKey,
    pub operator: Option<UserId>,
    pub action: AuditAction,
    pub title: String,
    pub description: String,
    pub color: u32,
}

/// What a notifier did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No channel configured; nothing was attempted.
    Skipped,
}

/// Trait for audit-log sinks.
///
/// Object safe so services can hold a `Box<dyn Notifier>` chosen at
/// runtime.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish an event.
    ///
    /// # Errors
    /// Returns [`NotifyError`] when the channel refuses or is unreachable.
    async fn publish(&self, event: &AuditEvent) -> Result<Delivery, NotifyError>;
}

/// Registry of notifiers (composite pattern).
///
/// Publishes to every registered notifier. The combined delivery is `Sent`
/// if any notifier sent the event; the first failure is returned after all
/// notifiers have been tried.
#[derive(Default)]
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for NotifierRegistry {
    async fn publish(&self, event: &AuditEvent) -> Result<Delivery, NotifyError> {
        let mut delivery = Delivery::Skipped;
        let mut failure = None;
        for notifier in &self.notifiers {
            match notifier.publish(event).await {
                Ok(Delivery::Sent) => delivery = Delivery::Sent,
                Ok(Delivery::Skipped) => {}
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(delivery),
        }
    }
}

/// A no-op notifier for when no audit channel is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn publish(&self, _event: &AuditEvent) -> Result<Delivery, NotifyError> {
        Ok(Delivery::Skipped)
    }
}

/// A notifier that writes audit events to the tracing log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, event: &AuditEvent) -> Result<Delivery, NotifyError> {
        let operator = event.operator.as_ref().map_or("-", UserId::as_str);
        match &event.action {
            AuditAction::Entry {
                kind,
                amount,
                new_balance,
            } => {
                info!(
                    account = %event.account,
                    operator,
                    kind = %kind,
                    amount = %amount,
                    new_balance = %new_balance,
                    title = %event.title,
                    "Audit entry"
                );
            }
            action => {
                info!(
                    account = %event.account,
                    operator,
                    action = ?action,
                    title = %event.title,
                    "Audit event"
                );
            }
        }
        Ok(Delivery::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        async fn publish(&self, _event: &AuditEvent) -> Result<Delivery, NotifyError> {
            Err(NotifyError::Unavailable("offline".into()))
        }
    }

    fn event() -> AuditEvent {
        AuditEvent {
            account: AccountKey::new("u1", "g1"),
            operator: Some(UserId::new("m1")),
            action: AuditAction::Registered,
            title: "ATM - User Registered".into(),
            description: "registered".into(),
            color: color::REGISTERED,
        }
    }

    #[tokio::test]
    async fn empty_registry_skips() {
        let registry = NotifierRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.publish(&event()).await.unwrap(), Delivery::Skipped);
    }

    #[tokio::test]
    async fn registry_reports_failure_after_trying_all() {
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(Failing));
        registry.register(Box::new(LogNotifier));
        assert_eq!(registry.len(), 2);
        assert!(matches!(
            registry.publish(&event()).await,
            Err(NotifyError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn log_notifier_sends() {
        assert_eq!(LogNotifier.publish(&event()).await.unwrap(), Delivery::Sent);
        assert_eq!(NullNotifier.publish(&event()).await.unwrap(), Delivery::Skipped);
    }
}
