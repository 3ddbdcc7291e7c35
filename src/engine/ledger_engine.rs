use std::sync::Arc;

use moka::future::Cache;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::SearchFilter;
use crate::generators::{Clock, IdGenerator, RandomIdGenerator, SystemClock};
use crate::models::{Account, AccountStatus, AccountType, Category, LedgerEntry, LedgerError, Page};
use crate::storage::{AccountLocks, LockSet, Storage, WriteBatch};
use crate::types::{has_valid_scale, AccountId, OwnerId};

/// Mutations validate, lock in ascending id order, re-read, then commit once.
/// The commit is synchronous, so a dropped future never stops halfway.
pub struct LedgerEngine<S: Storage> {
    storage: Arc<S>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    locks: AccountLocks,
    /// Account number to id; numbers are immutable and never reused.
    resolver: Cache<String, AccountId>,
    config: EngineConfig
}

impl<S: Storage> LedgerEngine<S> {
    pub fn new(storage: Arc<S>) -> Self {
        let config = EngineConfig::default();

        Self {
            storage,
            ids: Arc::new(RandomIdGenerator::new()),
            clock: Arc::new(SystemClock),
            locks: AccountLocks::new(),
            resolver: Cache::new(config.resolver_cache_capacity),
            config
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.resolver = Cache::new(config.resolver_cache_capacity);
        self.config = config;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn locks(&self) -> &AccountLocks {
        &self.locks
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn open_account(&self, owner_id: OwnerId, account_type: AccountType) -> Result<Account, LedgerError> {
        let attempts = self.config.account_number_attempts;

        for attempt in 1..=attempts {
            let account_number = self.ids.account_number();

            if self.storage.exists_by_account_number(&account_number) {
                debug!("Account number collision on attempt {attempt} of {attempts}");
                continue;
            }

            match self.storage.create(owner_id, account_number, account_type, self.clock.now()) {
                Ok(account) => {
                    self.resolver.insert(account.account_number.clone(), account.account_id).await;
                    info!("Opened [{account_type}] account [{}] for owner [{owner_id}]", account.account_id);
                    return Ok(account);
                }
                Err(LedgerError::DuplicateAccountNumber { .. }) => {
                    debug!("Account number taken concurrently on attempt {attempt} of {attempts}");
                }
                Err(error) => return Err(error)
            }
        }

        warn!("Gave up generating an account number for owner [{owner_id}] after {attempts} attempts");
        Err(LedgerError::account_number_exhausted(attempts))
    }

    /// Soft delete; only an empty, active account can be closed.
    pub async fn close_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.load(account_id)?;
        let _locks = self.lock(&[account_id]).await?;

        let mut account = self.load(account_id)?;
        account.close(self.clock.now())?;

        let mut batch = WriteBatch::new();
        batch.save(account);
        self.storage.commit(batch)?;

        info!("Closed account [{account_id}]");

        self.load(account_id)
    }

    pub fn account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.load(account_id)
    }

    pub fn accounts_by_owner(&self, owner_id: OwnerId, status: Option<AccountStatus>) -> Vec<Account> {
        self.storage.find_by_owner(owner_id, status)
    }

    pub async fn deposit(&self, account_id: AccountId, amount: Decimal, category: Category) -> Result<Account, LedgerError> {
        validate_amount(amount)?;

        if !category.is_deposit() {
            return Err(LedgerError::invalid_category(category, "deposit"));
        }

        self.load(account_id)?;
        let _locks = self.lock(&[account_id]).await?;

        let now = self.clock.now();
        let mut account = self.load(account_id)?;
        account.ensure_active()?;
        account.credit(amount, now)?;

        let entry = LedgerEntry::new(self.ids.reference_id(), account_id, None, amount, category, category.deposit_description(), now);
        let mut batch = WriteBatch::new();
        batch.save(account).append(entry);
        let committed = self.storage.commit(batch)?;

        info!("Deposited [{amount}] into account [{account_id}] as [{category}] ({})", reference_of(&committed));

        self.load(account_id)
    }

    /// The description is stored verbatim; masking card data is the caller's job.
    pub async fn withdraw(&self, account_id: AccountId, amount: Decimal, description: impl Into<String>, category: Category) -> Result<(), LedgerError> {
        validate_amount(amount)?;

        if !category.is_debit() {
            return Err(LedgerError::invalid_category(category, "withdrawal"));
        }

        self.load(account_id)?;
        let _locks = self.lock(&[account_id]).await?;

        let now = self.clock.now();
        let mut account = self.load(account_id)?;
        account.ensure_active()?;
        account.debit(amount, now)?;

        let entry = LedgerEntry::new(self.ids.reference_id(), account_id, None, amount, category, description, now);
        let mut batch = WriteBatch::new();
        batch.save(account).append(entry);
        let committed = self.storage.commit(batch)?;

        info!("Withdrew [{amount}] from account [{account_id}] as [{category}] ({})", reference_of(&committed));

        Ok(())
    }

    pub async fn transfer(&self, from_account_id: AccountId, to_account_id: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        if from_account_id == to_account_id {
            return Err(LedgerError::self_transfer(from_account_id));
        }

        validate_amount(amount)?;

        self.load(from_account_id)?;
        self.load(to_account_id)?;
        let _locks = self.lock(&[from_account_id, to_account_id]).await?;

        let now = self.clock.now();
        let mut sender = self.load(from_account_id)?;
        let mut receiver = self.load(to_account_id)?;

        sender.ensure_active()?;
        receiver.ensure_active()?;
        sender.debit(amount, now)?;
        receiver.credit(amount, now)?;

        let description = format!("Transfer to {}", receiver.account_number);
        let entry = LedgerEntry::new(self.ids.reference_id(), from_account_id, Some(to_account_id), amount, Category::Transfer, description, now);

        let mut batch = WriteBatch::new();
        batch.save(sender).save(receiver).append(entry);
        let committed = self.storage.commit(batch)?;

        info!("Transferred [{amount}] from account [{from_account_id}] to account [{to_account_id}] ({})", reference_of(&committed));

        Ok(())
    }

    pub async fn transfer_to_account_number(&self, from_account_id: AccountId, to_account_number: &str, amount: Decimal) -> Result<(), LedgerError> {
        let to_account_id = self.resolve_account_number(to_account_number).await?;
        self.transfer(from_account_id, to_account_id, amount).await
    }

    pub async fn resolve_account_number(&self, account_number: &str) -> Result<AccountId, LedgerError> {
        if let Some(account_id) = self.resolver.get(account_number).await {
            return Ok(account_id);
        }

        let account = self.storage.find_by_account_number(account_number)
            .ok_or_else(|| LedgerError::account_number_not_found(account_number))?;

        self.resolver.insert(account.account_number.clone(), account.account_id).await;

        Ok(account.account_id)
    }

    /// Newest first; `page_size` falls back to the configured default.
    pub fn history(&self, account_id: AccountId, page: usize, page_size: Option<usize>) -> Result<Page<LedgerEntry>, LedgerError> {
        let page_size = page_size.unwrap_or(self.config.default_page_size);

        if page_size == 0 || page_size > self.config.max_page_size {
            return Err(LedgerError::invalid_query(format!("page size must be between 1 and {}", self.config.max_page_size)));
        }

        self.load(account_id)?;

        let history = self.storage.find_by_account(account_id, page, page_size);
        debug!("History page {page} for account [{account_id}] returned {} entries (last page: {})", history.items.len(), history.is_last());

        Ok(history)
    }

    /// An unknown account simply has no entries.
    pub fn search(&self, account_id: AccountId, filter: &SearchFilter) -> Result<Vec<LedgerEntry>, LedgerError> {
        filter.validate()?;

        let entries: Vec<LedgerEntry> = self.storage.entries_for_account(account_id)
            .into_iter()
            .filter(|entry| filter.matches(entry, account_id))
            .collect();

        debug!("Search for account [{account_id}] matched {} entries", entries.len());

        Ok(entries)
    }

    fn load(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.storage.get(account_id).ok_or_else(|| LedgerError::account_not_found(account_id))
    }

    async fn lock(&self, account_ids: &[AccountId]) -> Result<LockSet, LedgerError> {
        self.locks.acquire(account_ids, self.config.lock_timeout).await
    }
}

fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO || !has_valid_scale(amount) {
        return Err(LedgerError::invalid_amount(amount));
    }

    Ok(())
}

fn reference_of(committed: &[LedgerEntry]) -> &str {
    committed.first().map(|entry| entry.reference_id.as_str()).unwrap_or("-")
}
