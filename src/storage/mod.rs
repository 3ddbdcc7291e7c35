mod batch;
mod locks;
mod memory_storage;

use chrono::{DateTime, Utc};

use crate::models::{Account, AccountStatus, AccountType, LedgerEntry, LedgerError, Page};
use crate::types::{AccountId, OwnerId};

pub use batch::WriteBatch;
pub use locks::{lock_order, AccountLocks, LockSet};
pub use memory_storage::MemoryStorage;

pub trait AccountStore: Send + Sync + 'static {
    fn get(&self, account_id: AccountId) -> Option<Account>;
    fn find_by_account_number(&self, account_number: &str) -> Option<Account>;
    fn exists_by_account_number(&self, account_number: &str) -> bool;
    /// Ordered by id.
    fn find_by_owner(&self, owner_id: OwnerId, status: Option<AccountStatus>) -> Vec<Account>;
    fn create(&self, owner_id: OwnerId, account_number: String, account_type: AccountType, now: DateTime<Utc>) -> Result<Account, LedgerError>;
    fn all(&self) -> Vec<Account>;
}

/// Append-only; entries are never updated or removed.
pub trait Journal: Send + Sync + 'static {
    /// Entries where the account is source or target, newest first.
    fn find_by_account(&self, account_id: AccountId, page: usize, page_size: usize) -> Page<LedgerEntry>;
    fn entries_for_account(&self, account_id: AccountId) -> Vec<LedgerEntry>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait Storage: AccountStore + Journal {
    /// Applies every write in `batch` or none of them.
    ///
    /// A saved account must carry the version currently stored, and a changed
    /// balance must be named by one of the batch's entries.
    fn commit(&self, batch: WriteBatch) -> Result<Vec<LedgerEntry>, LedgerError>;
}
