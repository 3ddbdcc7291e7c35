use crate::models::{Category, Direction};
use crate::types::{AccountId, ReferenceId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;

/// Immutable audit record of one balance-affecting event.
///
/// The amount is always a positive magnitude; whether money left or entered an
/// account is implied by the category and by which side the account sits on.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct LedgerEntry {
    /// Globally unique identifier, never reused.
    pub reference_id: ReferenceId,
    /// Journal position, assigned when the entry is committed.
    pub sequence: u64,
    pub source_account: AccountId,
    /// Present only for internal transfers.
    pub target_account: Option<AccountId>,
    pub amount: Decimal,
    pub category: Category,
    pub description: String,
    pub timestamp: DateTime<Utc>
}

impl LedgerEntry {
    pub fn new(
        reference_id: ReferenceId,
        source_account: AccountId,
        target_account: Option<AccountId>,
        amount: Decimal,
        category: Category,
        description: impl Into<String>,
        timestamp: DateTime<Utc>
    ) -> Self {
        Self {
            reference_id,
            sequence: 0,
            source_account,
            target_account,
            amount,
            category,
            description: description.into(),
            timestamp
        }
    }

    pub fn involves(&self, account_id: AccountId) -> bool {
        self.source_account == account_id || self.target_account == Some(account_id)
    }

    pub fn direction_for(&self, account_id: AccountId) -> Option<Direction> {
        if self.source_account == account_id {
            Some(Direction::Sent)
        } else if self.target_account == Some(account_id) {
            Some(Direction::Received)
        } else {
            None
        }
    }

    /// History ordering: latest timestamp first, later journal position first on ties.
    pub fn newest_first(left: &LedgerEntry, right: &LedgerEntry) -> Ordering {
        right.timestamp.cmp(&left.timestamp)
            .then_with(|| right.sequence.cmp(&left.sequence))
    }
}
