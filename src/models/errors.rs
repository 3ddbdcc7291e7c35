use crate::models::Category;
use crate::types::{AccountId, ReferenceId};
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Coarse classification callers use to decide how to react to a failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorKind {
    /// Caller input broke a precondition. Never retried.
    Validation,
    /// A referenced account does not exist.
    NotFound,
    /// Business rule rejection on the balance.
    InsufficientFunds,
    /// Contention; the whole operation may be retried from scratch.
    Transient,
    /// A storage constraint was violated; fatal to the operation.
    Integrity,
    /// A bounded generator ran out of attempts.
    Exhausted
}

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum LedgerError {
    #[error("Amount [{amount}] must be positive with at most 4 decimal places")]
    InvalidAmount {
        amount: Decimal
    },
    #[error("Cannot transfer funds from account [{account_id}] to itself")]
    SelfTransfer {
        account_id: AccountId
    },
    #[error("Category [{category}] is not allowed for {operation}")]
    InvalidCategory {
        category: Category,
        operation: &'static str
    },
    #[error("Account [{account_id}] is closed")]
    AccountClosed {
        account_id: AccountId
    },
    #[error("Account [{account_id}] still holds [{balance}] and cannot be closed")]
    BalanceNotZero {
        account_id: AccountId,
        balance: Decimal
    },
    #[error("Invalid query: {reason}")]
    InvalidQuery {
        reason: String
    },
    #[error("Account [{account_id}] was not found")]
    AccountNotFound {
        account_id: AccountId
    },
    #[error("Account number [{account_number}] was not found")]
    AccountNumberNotFound {
        account_number: String
    },
    #[error("Insufficient funds in account [{account_id}]: balance [{balance}], requested [{requested}]")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Decimal,
        requested: Decimal
    },
    #[error("Timed out after {waited:?} waiting for the lock on account [{account_id}]")]
    LockTimeout {
        account_id: AccountId,
        waited: Duration
    },
    #[error("Reference id [{reference_id}] already exists in the journal")]
    DuplicateReference {
        reference_id: ReferenceId
    },
    #[error("Account number [{account_number}] is already in use")]
    DuplicateAccountNumber {
        account_number: String
    },
    #[error("Write batch rejected: {reason}")]
    BatchRejected {
        reason: String
    },
    #[error("Numeric overflow on account [{account_id}]")]
    Overflow {
        account_id: AccountId
    },
    #[error("Could not generate a free account number after {attempts} attempts")]
    AccountNumberExhausted {
        attempts: u32
    }
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount { .. }
            | Self::SelfTransfer { .. }
            | Self::InvalidCategory { .. }
            | Self::AccountClosed { .. }
            | Self::BalanceNotZero { .. }
            | Self::InvalidQuery { .. } => ErrorKind::Validation,
            Self::AccountNotFound { .. } | Self::AccountNumberNotFound { .. } => ErrorKind::NotFound,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::LockTimeout { .. } => ErrorKind::Transient,
            Self::DuplicateReference { .. }
            | Self::DuplicateAccountNumber { .. }
            | Self::BatchRejected { .. }
            | Self::Overflow { .. } => ErrorKind::Integrity,
            Self::AccountNumberExhausted { .. } => ErrorKind::Exhausted
        }
    }

    /// Only contention failures are safe to retry, and only as a whole operation.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    pub fn invalid_amount(amount: Decimal) -> Self {
        Self::InvalidAmount { amount }
    }

    pub fn self_transfer(account_id: AccountId) -> Self {
        Self::SelfTransfer { account_id }
    }

    pub fn invalid_category(category: Category, operation: &'static str) -> Self {
        Self::InvalidCategory { category, operation }
    }

    pub fn account_closed(account_id: AccountId) -> Self {
        Self::AccountClosed { account_id }
    }

    pub fn balance_not_zero(account_id: AccountId, balance: Decimal) -> Self {
        Self::BalanceNotZero { account_id, balance }
    }

    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery { reason: reason.into() }
    }

    pub fn account_not_found(account_id: AccountId) -> Self {
        Self::AccountNotFound { account_id }
    }

    pub fn account_number_not_found(account_number: impl Into<String>) -> Self {
        Self::AccountNumberNotFound { account_number: account_number.into() }
    }

    pub fn insufficient_funds(account_id: AccountId, balance: Decimal, requested: Decimal) -> Self {
        Self::InsufficientFunds { account_id, balance, requested }
    }

    pub fn lock_timeout(account_id: AccountId, waited: Duration) -> Self {
        Self::LockTimeout { account_id, waited }
    }

    pub fn duplicate_reference(reference_id: impl Into<ReferenceId>) -> Self {
        Self::DuplicateReference { reference_id: reference_id.into() }
    }

    pub fn duplicate_account_number(account_number: impl Into<String>) -> Self {
        Self::DuplicateAccountNumber { account_number: account_number.into() }
    }

    pub fn batch_rejected(reason: impl Into<String>) -> Self {
        Self::BatchRejected { reason: reason.into() }
    }

    pub fn overflow(account_id: AccountId) -> Self {
        Self::Overflow { account_id }
    }

    pub fn account_number_exhausted(attempts: u32) -> Self {
        Self::AccountNumberExhausted { attempts }
    }
}
