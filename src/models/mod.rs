mod account;
mod entry;
mod errors;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

pub use account::Account;
pub use entry::LedgerEntry;
pub use errors::{ErrorKind, LedgerError};

/// Classification of a balance-affecting event.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Money added at a branch.
    CashDeposit,
    /// Money added at an ATM with a debit card.
    CardDeposit,
    /// Money moved between two internal accounts.
    Transfer,
    /// Money spent with a debit card.
    CardPurchase
}

impl Category {
    pub fn is_deposit(&self) -> bool {
        matches!(self, Category::CashDeposit | Category::CardDeposit)
    }

    pub fn is_debit(&self) -> bool {
        matches!(self, Category::CardPurchase)
    }

    /// Journal description used for deposits of this category.
    pub fn deposit_description(&self) -> &'static str {
        match self {
            Category::CardDeposit => "Deposit via ATM",
            _ => "Deposit via Branch"
        }
    }
}

impl Display for Category {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::CashDeposit => "CASH_DEPOSIT",
            Category::CardDeposit => "CARD_DEPOSIT",
            Category::Transfer => "TRANSFER",
            Category::CardPurchase => "CARD_PURCHASE"
        };

        formatter.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Closed
}

impl Display for AccountStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => formatter.write_str("ACTIVE"),
            AccountStatus::Closed => formatter.write_str("CLOSED")
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    #[default]
    Savings,
    Checking
}

impl Display for AccountType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Savings => formatter.write_str("SAVINGS"),
            AccountType::Checking => formatter.write_str("CHECKING")
        }
    }
}

/// Which side of an entry an account sits on.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// The account is the entry's source.
    Sent,
    /// The account is the entry's target.
    Received
}

/// One page of an ordered result set.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero based page index.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }

        self.total_items.div_ceil(self.page_size)
    }

    pub fn is_last(&self) -> bool {
        self.page.saturating_add(1) >= self.total_pages()
    }
}
