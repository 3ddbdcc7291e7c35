//! Ledger engine for a small retail bank.
//!
//! Moves money between accounts (deposits, withdrawals, card purchases and
//! internal transfers) while keeping balances non-negative and writing exactly
//! one immutable journal entry per committed balance change.

pub mod config;
pub mod engine;
pub mod generators;
pub mod ingest;
pub mod models;
pub mod storage;
pub mod types;

pub use config::EngineConfig;
pub use engine::{LedgerEngine, SearchFilter};
pub use models::{Account, AccountStatus, AccountType, Category, Direction, ErrorKind, LedgerEntry, LedgerError, Page};
pub use storage::{AccountStore, Journal, MemoryStorage, Storage};
