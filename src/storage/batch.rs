use crate::models::{Account, LedgerEntry};

/// Account saves plus journal appends that commit as one unit.
///
/// Only the engine stages writes; outside the crate a batch can be named but
/// not filled.
#[derive(Debug)]
pub struct WriteBatch {
    pub(crate) accounts: Vec<Account>,
    pub(crate) entries: Vec<LedgerEntry>
}

impl WriteBatch {
    pub(crate) fn new() -> Self {
        Self { accounts: Vec::new(), entries: Vec::new() }
    }

    pub(crate) fn save(&mut self, account: Account) -> &mut Self {
        self.accounts.push(account);
        self
    }

    pub(crate) fn append(&mut self, entry: LedgerEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.entries.is_empty()
    }
}
