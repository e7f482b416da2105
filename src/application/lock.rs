//! Per-account mutation locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::AccountKey;

/// Serializes mutations of the same account while letting different
/// accounts proceed in parallel.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: DashMap<AccountKey, Arc<Mutex<()>>>,
}

impl AccountLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: &AccountKey) -> AccountGuard<'_> {
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        AccountGuard {
            guard: Some(mutex.lock_owned().await),
            locks: &self.locks,
            key: key.clone(),
        }
    }

    /// Number of accounts currently held or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one account. The account's entry is evicted when
/// the last holder or waiter lets go.
#[derive(Debug)]
pub struct AccountGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<AccountKey, Arc<Mutex<()>>>,
    key: AccountKey,
}

impl Drop for AccountGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone, so a count of one is the map's.
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
