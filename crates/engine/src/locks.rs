//! Per-account exclusive locks.
//!
//! Operations that read-then-write balances lock every account they touch
//! before opening the store transaction. Keys are always acquired in
//! ascending order so two opposite-direction transfers cannot deadlock.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Slots are pruned once the registry grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

/// An account is identified by its owner identity and currency code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct AccountKey {
    identity: i64,
    currency_code: String,
}

impl AccountKey {
    pub(crate) fn new(identity: i64, currency_code: &str) -> Self {
        Self {
            identity,
            currency_code: currency_code.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct AccountLocks {
    slots: Mutex<HashMap<AccountKey, Arc<AsyncMutex<()>>>>,
}

/// Held locks; released on drop.
#[derive(Debug)]
pub(crate) struct AccountGuards {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl AccountLocks {
    /// Lock every key, deduplicated, in ascending order.
    pub(crate) async fn acquire(&self, keys: impl IntoIterator<Item = AccountKey>) -> AccountGuards {
        let mut keys: Vec<AccountKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            let slot = self.slot(key);
            guards.push(slot.lock_owned().await);
        }
        AccountGuards { _guards: guards }
    }

    fn slot(&self, key: AccountKey) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.len() > PRUNE_THRESHOLD {
            // Only the registry holds a reference: nobody waits on the slot.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        }
        slots.entry(key).or_default().clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
