use chrono::NaiveDate;

use crate::models::{Category, Direction, LedgerEntry, LedgerError};
use crate::types::AccountId;

/// Read-side filter over one account's journal entries.
///
/// Dates are inclusive and compared at day granularity in UTC, so `to` covers
/// everything up to the end of that day.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SearchFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub direction: Option<Direction>,
    pub category: Option<Category>
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_date(mut self, from: NaiveDate) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to_date(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(LedgerError::invalid_query(format!("start date {from} is after end date {to}")));
            }
        }

        Ok(())
    }

    pub fn matches(&self, entry: &LedgerEntry, account_id: AccountId) -> bool {
        let day = entry.timestamp.date_naive();

        if self.from.is_some_and(|from| day < from) || self.to.is_some_and(|to| day > to) {
            return false;
        }

        if let Some(direction) = self.direction {
            if entry.direction_for(account_id) != Some(direction) {
                return false;
            }
        }

        self.category.is_none_or(|category| entry.category == category)
    }
}
