use crate::models::LedgerError;
use crate::types::AccountId;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{timeout_at, Instant};
use tracing::{trace, warn};

/// Ascending id, each id once.
pub fn lock_order(account_ids: &[AccountId]) -> Vec<AccountId> {
    let mut ordered = account_ids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();
    ordered
}

/// Accounts are never removed, so entries are never evicted.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>
}

#[derive(Debug)]
pub struct LockSet {
    guards: Vec<(AccountId, OwnedMutexGuard<()>)>
}

impl LockSet {
    pub fn account_ids(&self) -> Vec<AccountId> {
        self.guards.iter().map(|(account_id, _)| *account_id).collect()
    }

    pub fn holds(&self, account_id: AccountId) -> bool {
        self.guards.iter().any(|(held, _)| *held == account_id)
    }
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits at most `wait` in total; on timeout the locks already taken are released.
    pub async fn acquire(&self, account_ids: &[AccountId], wait: Duration) -> Result<LockSet, LedgerError> {
        let deadline = Instant::now() + wait;
        let mut guards = Vec::with_capacity(account_ids.len());

        for account_id in lock_order(account_ids) {
            let lock = self.lock_for(account_id);

            match timeout_at(deadline, lock.lock_owned()).await {
                Ok(guard) => {
                    trace!("Locked account [{account_id}]");
                    guards.push((account_id, guard));
                }
                Err(_) => {
                    warn!("Lock wait on account [{account_id}] exceeded {wait:?}");
                    return Err(LedgerError::lock_timeout(account_id, wait));
                }
            }
        }

        Ok(LockSet { guards })
    }

    fn lock_for(&self, account_id: AccountId) -> Arc<Mutex<()>> {
        self.locks.entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
