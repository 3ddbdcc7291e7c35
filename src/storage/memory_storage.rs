use crate::models::{Account, AccountStatus, AccountType, LedgerEntry, LedgerError, Page};
use crate::storage::{AccountStore, Journal, Storage, WriteBatch};
use crate::types::{AccountId, OwnerId, ReferenceId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    /// Unique account number index.
    numbers: HashMap<String, AccountId>,
    entries: Vec<LedgerEntry>,
    /// Unique reference id index.
    references: HashSet<ReferenceId>,
    /// Positions in `entries` per source or target account.
    entries_by_account: HashMap<AccountId, Vec<usize>>,
    last_account_id: AccountId
}

impl State {
    fn check(&self, batch: &WriteBatch) -> Result<(), LedgerError> {
        if batch.is_empty() {
            return Err(LedgerError::batch_rejected("batch is empty"));
        }

        let mut saved = HashSet::new();

        for account in &batch.accounts {
            let Some(stored) = self.accounts.get(&account.account_id) else {
                return Err(LedgerError::batch_rejected(format!("account [{}] does not exist", account.account_id)));
            };

            if !saved.insert(account.account_id) {
                return Err(LedgerError::batch_rejected(format!("account [{}] saved twice", account.account_id)));
            }

            if stored.version != account.version {
                return Err(LedgerError::batch_rejected(format!(
                    "account [{}] is stale: version {} saved over version {}",
                    account.account_id, account.version, stored.version
                )));
            }

            if stored.account_number != account.account_number {
                return Err(LedgerError::batch_rejected(format!("account number of [{}] is immutable", account.account_id)));
            }

            if account.balance < Decimal::ZERO {
                return Err(LedgerError::batch_rejected(format!("balance of account [{}] would be negative", account.account_id)));
            }

            let journaled = batch.entries.iter().any(|entry| entry.involves(account.account_id));

            if stored.balance != account.balance && !journaled {
                return Err(LedgerError::batch_rejected(format!("balance of account [{}] changed without a journal entry", account.account_id)));
            }
        }

        let mut seen = HashSet::new();

        for entry in &batch.entries {
            if self.references.contains(&entry.reference_id) || !seen.insert(entry.reference_id.as_str()) {
                return Err(LedgerError::duplicate_reference(entry.reference_id.clone()));
            }

            let accounts = std::iter::once(entry.source_account).chain(entry.target_account);

            for account_id in accounts {
                if !self.accounts.contains_key(&account_id) {
                    return Err(LedgerError::batch_rejected(format!("entry [{}] references unknown account [{account_id}]", entry.reference_id)));
                }
            }
        }

        Ok(())
    }

    fn sorted_entries(&self, account_id: AccountId) -> Vec<LedgerEntry> {
        let mut entries: Vec<LedgerEntry> = self.entries_by_account.get(&account_id)
            .map(|positions| positions.iter().filter_map(|&position| self.entries.get(position).cloned()).collect())
            .unwrap_or_default();

        entries.sort_by(LedgerEntry::newest_first);
        entries
    }
}

/// Accounts and journal behind one lock; a commit holds it exclusively.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: RwLock<State>
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AccountStore for MemoryStorage {
    fn get(&self, account_id: AccountId) -> Option<Account> {
        self.read().accounts.get(&account_id).cloned()
    }

    fn find_by_account_number(&self, account_number: &str) -> Option<Account> {
        let state = self.read();
        state.numbers.get(account_number)
            .and_then(|account_id| state.accounts.get(account_id))
            .cloned()
    }

    fn exists_by_account_number(&self, account_number: &str) -> bool {
        self.read().numbers.contains_key(account_number)
    }

    fn find_by_owner(&self, owner_id: OwnerId, status: Option<AccountStatus>) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.read().accounts.values()
            .filter(|account| account.owner_id == owner_id)
            .filter(|account| status.is_none_or(|wanted| account.status == wanted))
            .cloned()
            .collect();

        accounts.sort_by_key(|account| account.account_id);
        accounts
    }

    fn create(&self, owner_id: OwnerId, account_number: String, account_type: AccountType, now: DateTime<Utc>) -> Result<Account, LedgerError> {
        let mut state = self.write();

        if state.numbers.contains_key(&account_number) {
            return Err(LedgerError::duplicate_account_number(account_number));
        }

        state.last_account_id += 1;
        let account = Account::new(state.last_account_id, owner_id, account_number, account_type, now);

        state.numbers.insert(account.account_number.clone(), account.account_id);
        state.accounts.insert(account.account_id, account.clone());

        debug!("Stored account [{}] with number [{}]", account.account_id, account.account_number);

        Ok(account)
    }

    fn all(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.read().accounts.values().cloned().collect();
        accounts.sort_by_key(|account| account.account_id);
        accounts
    }
}

impl Journal for MemoryStorage {
    fn find_by_account(&self, account_id: AccountId, page: usize, page_size: usize) -> Page<LedgerEntry> {
        let entries = self.read().sorted_entries(account_id);
        let total_items = entries.len();
        let items = entries.into_iter()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .collect();

        Page { items, page, page_size, total_items }
    }

    fn entries_for_account(&self, account_id: AccountId) -> Vec<LedgerEntry> {
        self.read().sorted_entries(account_id)
    }

    fn len(&self) -> usize {
        self.read().entries.len()
    }
}

impl Storage for MemoryStorage {
    fn commit(&self, batch: WriteBatch) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut state = self.write();

        if let Err(rejection) = state.check(&batch) {
            error!("Commit rejected, nothing written: {rejection}");
            return Err(rejection);
        }

        let WriteBatch { accounts, entries } = batch;

        for mut account in accounts {
            account.version += 1;
            state.accounts.insert(account.account_id, account);
        }

        let mut committed = Vec::with_capacity(entries.len());

        for mut entry in entries {
            let position = state.entries.len();
            entry.sequence = position as u64 + 1;

            state.references.insert(entry.reference_id.clone());
            state.entries_by_account.entry(entry.source_account).or_default().push(position);

            if let Some(target) = entry.target_account {
                state.entries_by_account.entry(target).or_default().push(position);
            }

            state.entries.push(entry.clone());
            committed.push(entry);
        }

        Ok(committed)
    }
}
