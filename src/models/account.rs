use crate::models::errors::LedgerError;
use crate::models::{AccountStatus, AccountType};
use crate::types::{AccountId, OwnerId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Current state of a single customer account.
///
/// The balance and status can only be changed from inside this crate; callers
/// move money through [`crate::engine::LedgerEngine`] so that every balance
/// change is paired with a journal entry.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Account {
    /// Store assigned identifier.
    pub account_id: AccountId,
    /// Opaque reference to the owning customer.
    pub owner_id: OwnerId,
    /// Externally visible 12 digit number, unique and never reused.
    pub account_number: String,
    pub account_type: AccountType,
    pub(crate) balance: Decimal,
    pub(crate) status: AccountStatus,
    /// Bumped by the store on every committed save.
    pub(crate) version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

impl Account {
    /// Creates a new, empty and active account.
    pub fn new(account_id: AccountId, owner_id: OwnerId, account_number: String, account_type: AccountType, now: DateTime<Utc>) -> Self {
        Self {
            account_id,
            owner_id,
            account_number,
            account_type,
            balance: Decimal::ZERO,
            status: AccountStatus::Active,
            version: 0,
            created_at: now,
            updated_at: now
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn ensure_active(&self) -> Result<(), LedgerError> {
        if !self.is_active() {
            return Err(LedgerError::account_closed(self.account_id));
        }

        Ok(())
    }

    pub(crate) fn credit(&mut self, amount: Decimal, now: DateTime<Utc>) -> Result<(), LedgerError> {
        self.balance = self.balance.checked_add(amount)
            .ok_or_else(|| LedgerError::overflow(self.account_id))?;
        self.updated_at = now;

        Ok(())
    }

    /// Removes `amount` from the balance, refusing to go below zero.
    pub(crate) fn debit(&mut self, amount: Decimal, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if self.balance < amount {
            return Err(LedgerError::insufficient_funds(self.account_id, self.balance, amount));
        }

        self.balance = self.balance.checked_sub(amount)
            .ok_or_else(|| LedgerError::overflow(self.account_id))?;
        self.updated_at = now;

        Ok(())
    }

    /// Moves the account to `CLOSED`. Only empty, active accounts can be closed.
    pub(crate) fn close(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        self.ensure_active()?;

        if !self.balance.is_zero() {
            return Err(LedgerError::balance_not_zero(self.account_id, self.balance));
        }

        self.status = AccountStatus::Closed;
        self.updated_at = now;

        Ok(())
    }
}
