use super::{LedgerEngine, SearchFilter};

use anyhow::{anyhow, Result};
use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::config::EngineConfig;
use crate::generators::{ManualClock, SequentialIdGenerator};
use crate::models::{Account, AccountStatus, AccountType, Category, Direction, ErrorKind, LedgerError};
use crate::storage::{AccountStore, Journal, MemoryStorage};

fn money(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or_default()
}

fn create_engine() -> LedgerEngine<MemoryStorage> {
    LedgerEngine::new(Arc::new(MemoryStorage::new()))
        .with_id_generator(Arc::new(SequentialIdGenerator::new()))
}

async fn funded_account(engine: &LedgerEngine<MemoryStorage>, owner_id: u64, amount: &str) -> Result<Account> {
    let account = engine.open_account(owner_id, AccountType::Savings).await?;

    if amount == "0" {
        return Ok(account);
    }

    Ok(engine.deposit(account.account_id, money(amount), Category::CashDeposit).await?)
}

fn balance_of(engine: &LedgerEngine<MemoryStorage>, account_id: u64) -> Result<Decimal> {
    Ok(engine.account(account_id)?.balance())
}

#[tokio::test]
async fn test_open_account_starts_empty_with_twelve_digit_number() -> Result<()> {
    let engine = LedgerEngine::new(Arc::new(MemoryStorage::new()));

    let first = engine.open_account(1, AccountType::Savings).await?;
    let second = engine.open_account(1, AccountType::Savings).await?;

    assert_eq!(first.account_number.len(), 12);
    assert!(first.account_number.chars().all(|c| c.is_ascii_digit()));
    assert_ne!(first.account_number, second.account_number);
    assert!(first.balance().is_zero());
    assert_eq!(first.status(), AccountStatus::Active);
    assert_eq!(engine.accounts_by_owner(1, None).len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_open_account_records_requested_type() -> Result<()> {
    let engine = create_engine();

    let checking = engine.open_account(1, AccountType::Checking).await?;
    let funded = engine.deposit(checking.account_id, money("10.00"), Category::CashDeposit).await?;

    assert_eq!(funded.account_type, AccountType::Checking);
    assert_eq!(funded.version(), 1);
    assert_eq!(engine.account(checking.account_id)?, funded);

    Ok(())
}

#[tokio::test]
async fn test_open_account_retries_past_collisions() -> Result<()> {
    let ids = SequentialIdGenerator::new().with_account_numbers(["111111111111", "111111111111"]);
    let engine = LedgerEngine::new(Arc::new(MemoryStorage::new())).with_id_generator(Arc::new(ids));

    let first = engine.open_account(1, AccountType::Savings).await?;
    let second = engine.open_account(2, AccountType::Savings).await?;

    assert_eq!(first.account_number, "111111111111");
    assert_eq!(second.account_number, "100000000000");

    Ok(())
}

#[tokio::test]
async fn test_open_account_gives_up_after_bounded_attempts() -> Result<()> {
    let ids = SequentialIdGenerator::new().with_account_numbers(["222222222222"; 4]);
    let engine = LedgerEngine::new(Arc::new(MemoryStorage::new()))
        .with_id_generator(Arc::new(ids))
        .with_config(EngineConfig::new().with_account_number_attempts(3));

    engine.open_account(1, AccountType::Savings).await?;
    let result = engine.open_account(1, AccountType::Savings).await;

    match result {
        Err(error) => {
            assert_eq!(error, LedgerError::account_number_exhausted(3));
            assert_eq!(error.kind(), ErrorKind::Exhausted);
        }
        Ok(account) => return Err(anyhow!("Expected exhaustion, opened {account:?}"))
    }
    assert_eq!(engine.storage().all().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_deposit_updates_balance_and_records_one_entry() -> Result<()> {
    let engine = create_engine();
    let account = engine.open_account(1, AccountType::Savings).await?;

    let updated = engine.deposit(account.account_id, money("100.00"), Category::CardDeposit).await?;

    assert_eq!(updated.balance(), money("100.00"));
    assert_eq!(balance_of(&engine, account.account_id)?, money("100.00"));

    let entries = engine.storage().entries_for_account(account.account_id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, Category::CardDeposit);
    assert_eq!(entries[0].description, "Deposit via ATM");
    assert_eq!(entries[0].source_account, account.account_id);
    assert_eq!(entries[0].target_account, None);
    assert_eq!(entries[0].amount, money("100.00"));

    engine.deposit(account.account_id, money("5"), Category::CashDeposit).await?;
    let latest = engine.history(account.account_id, 0, None)?;
    assert_eq!(latest.items[0].description, "Deposit via Branch");

    Ok(())
}

#[tokio::test]
async fn test_deposit_rejections_leave_no_trace() -> Result<()> {
    let engine = create_engine();
    let account = engine.open_account(1, AccountType::Savings).await?;

    let zero = engine.deposit(account.account_id, Decimal::ZERO, Category::CashDeposit).await;
    let negative = engine.deposit(account.account_id, money("-5"), Category::CashDeposit).await;
    let too_precise = engine.deposit(account.account_id, money("0.00001"), Category::CashDeposit).await;
    let wrong_category = engine.deposit(account.account_id, money("5"), Category::Transfer).await;
    let missing = engine.deposit(99, money("5"), Category::CashDeposit).await;

    for result in [&zero, &negative, &too_precise, &wrong_category] {
        assert!(matches!(result, Err(error) if error.kind() == ErrorKind::Validation));
    }
    assert!(matches!(missing, Err(LedgerError::AccountNotFound { account_id: 99 })));

    assert!(balance_of(&engine, account.account_id)?.is_zero());
    assert!(engine.storage().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_withdraw_records_positive_magnitude_and_description() -> Result<()> {
    let engine = create_engine();
    let account = funded_account(&engine, 1, "100.00").await?;

    engine.withdraw(account.account_id, money("25.50"), "Card Purchase: 4321", Category::CardPurchase).await?;

    assert_eq!(balance_of(&engine, account.account_id)?, money("74.50"));

    let history = engine.history(account.account_id, 0, None)?;
    assert_eq!(history.total_items, 2);
    assert_eq!(history.items[0].category, Category::CardPurchase);
    assert_eq!(history.items[0].amount, money("25.50"));
    assert_eq!(history.items[0].description, "Card Purchase: 4321");

    Ok(())
}

#[tokio::test]
async fn test_withdraw_with_insufficient_funds_changes_nothing() -> Result<()> {
    let engine = create_engine();
    let account = funded_account(&engine, 1, "10.00").await?;
    let entries_before = engine.storage().len();

    let result = engine.withdraw(account.account_id, money("50.00"), "Card Purchase: 0000", Category::CardPurchase).await;

    assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
    assert_eq!(balance_of(&engine, account.account_id)?, money("10.00"));
    assert_eq!(engine.storage().len(), entries_before);

    Ok(())
}

#[tokio::test]
async fn test_withdraw_rejects_non_debit_categories() -> Result<()> {
    let engine = create_engine();
    let account = funded_account(&engine, 1, "10.00").await?;

    let result = engine.withdraw(account.account_id, money("1"), "refund", Category::CashDeposit).await;

    assert!(matches!(result, Err(LedgerError::InvalidCategory { .. })));
    assert_eq!(balance_of(&engine, account.account_id)?, money("10.00"));

    Ok(())
}

#[tokio::test]
async fn test_transfer_end_to_end_scenario() -> Result<()> {
    let engine = create_engine();
    let sender = funded_account(&engine, 1, "100.00").await?;
    let receiver = funded_account(&engine, 2, "50.00").await?;
    let entries_before = engine.storage().len();

    engine.transfer(sender.account_id, receiver.account_id, money("30.00")).await?;

    assert_eq!(balance_of(&engine, sender.account_id)?, money("70.00"));
    assert_eq!(balance_of(&engine, receiver.account_id)?, money("80.00"));
    assert_eq!(engine.storage().len(), entries_before + 1);

    let transfers = engine.search(sender.account_id, &SearchFilter::new().category(Category::Transfer))?;
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].source_account, sender.account_id);
    assert_eq!(transfers[0].target_account, Some(receiver.account_id));
    assert_eq!(transfers[0].amount, money("30.00"));
    assert_eq!(transfers[0].description, format!("Transfer to {}", receiver.account_number));

    let received = engine.search(receiver.account_id, &SearchFilter::new().direction(Direction::Received))?;
    assert_eq!(received, transfers);

    Ok(())
}

#[tokio::test]
async fn test_self_transfer_is_rejected() -> Result<()> {
    let engine = create_engine();
    let account = funded_account(&engine, 1, "100.00").await?;

    let result = engine.transfer(account.account_id, account.account_id, money("10")).await;

    assert!(matches!(result, Err(LedgerError::SelfTransfer { .. })));
    assert_eq!(result.err().map(|error| error.kind()), Some(ErrorKind::Validation));
    assert_eq!(balance_of(&engine, account.account_id)?, money("100.00"));

    Ok(())
}

#[tokio::test]
async fn test_transfer_failures_keep_both_balances() -> Result<()> {
    let engine = create_engine();
    let sender = funded_account(&engine, 1, "20.00").await?;
    let receiver = funded_account(&engine, 2, "0").await?;

    let missing = engine.transfer(sender.account_id, 99, money("5")).await;
    let insufficient = engine.transfer(sender.account_id, receiver.account_id, money("20.01")).await;
    let non_positive = engine.transfer(sender.account_id, receiver.account_id, Decimal::ZERO).await;

    assert!(matches!(missing, Err(LedgerError::AccountNotFound { account_id: 99 })));
    assert!(matches!(insufficient, Err(LedgerError::InsufficientFunds { .. })));
    assert!(matches!(non_positive, Err(LedgerError::InvalidAmount { .. })));

    assert_eq!(balance_of(&engine, sender.account_id)?, money("20.00"));
    assert!(balance_of(&engine, receiver.account_id)?.is_zero());
    assert_eq!(engine.storage().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_transfer_into_closed_account_is_rejected() -> Result<()> {
    let engine = create_engine();
    let sender = funded_account(&engine, 1, "40.00").await?;
    let receiver = engine.open_account(2, AccountType::Savings).await?;
    engine.close_account(receiver.account_id).await?;

    let result = engine.transfer(sender.account_id, receiver.account_id, money("10")).await;

    assert!(matches!(result, Err(LedgerError::AccountClosed { account_id }) if account_id == receiver.account_id));
    assert_eq!(balance_of(&engine, sender.account_id)?, money("40.00"));

    Ok(())
}

#[tokio::test]
async fn test_transfer_by_account_number_resolves_receiver() -> Result<()> {
    let engine = create_engine();
    let sender = funded_account(&engine, 1, "40.00").await?;
    let receiver = engine.open_account(2, AccountType::Savings).await?;

    engine.transfer_to_account_number(sender.account_id, &receiver.account_number, money("15")).await?;

    assert_eq!(balance_of(&engine, receiver.account_id)?, money("15"));

    let unknown = engine.transfer_to_account_number(sender.account_id, "999999999999", money("1")).await;
    assert!(matches!(unknown, Err(LedgerError::AccountNumberNotFound { .. })));
    assert_eq!(unknown.err().map(|error| error.kind()), Some(ErrorKind::NotFound));

    Ok(())
}

#[tokio::test]
async fn test_failed_journal_append_rolls_back_the_whole_transfer() -> Result<()> {
    // Both the funding deposit and the transfer are handed the same reference id,
    // so the transfer's journal append fails after both balances were computed.
    let ids = SequentialIdGenerator::new().with_reference_ids(["REF-X", "REF-X"]);
    let engine = LedgerEngine::new(Arc::new(MemoryStorage::new())).with_id_generator(Arc::new(ids));
    let sender = funded_account(&engine, 1, "100.00").await?;
    let receiver = engine.open_account(2, AccountType::Savings).await?;

    let result = engine.transfer(sender.account_id, receiver.account_id, money("30.00")).await;

    assert!(matches!(result, Err(LedgerError::DuplicateReference { .. })));
    assert_eq!(result.err().map(|error| error.kind()), Some(ErrorKind::Integrity));
    assert_eq!(balance_of(&engine, sender.account_id)?, money("100.00"));
    assert!(balance_of(&engine, receiver.account_id)?.is_zero());
    assert_eq!(engine.storage().len(), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_never_overdraw() -> Result<()> {
    for _ in 0..20 {
        let engine = Arc::new(create_engine());
        let account_id = funded_account(&engine, 1, "100.00").await?.account_id;
        let mut tasks = JoinSet::new();

        for _ in 0..2 {
            let engine = engine.clone();
            tasks.spawn(async move {
                engine.withdraw(account_id, money("60.00"), "Card Purchase: 1111", Category::CardPurchase).await
            });
        }

        let mut successes = 0;
        let mut rejections = 0;

        while let Some(result) = tasks.join_next().await {
            match result? {
                Ok(()) => successes += 1,
                Err(LedgerError::InsufficientFunds { .. }) => rejections += 1,
                Err(error) => return Err(anyhow!("Unexpected failure: {error}"))
            }
        }

        assert_eq!((successes, rejections), (1, 1));
        assert_eq!(balance_of(&engine, account_id)?, money("40.00"));
        assert_eq!(engine.storage().len(), 2);
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opposing_transfers_conserve_money() -> Result<()> {
    let engine = Arc::new(create_engine());
    let mut account_ids = Vec::new();

    for owner in 1..=4 {
        account_ids.push(funded_account(&engine, owner, "100.00").await?.account_id);
    }

    let total_before: Decimal = account_ids.iter().map(|&id| balance_of(&engine, id)).sum::<Result<Decimal>>()?;
    let entries_before = engine.storage().len();
    let mut tasks = JoinSet::new();

    for index in 0..200usize {
        let engine = engine.clone();
        let from = account_ids[index % 4];
        let to = account_ids[(index + 1 + index / 4 % 3) % 4];
        let (from, to) = if index % 2 == 0 { (from, to) } else { (to, from) };

        tasks.spawn(async move {
            engine.transfer(from, to, money("7.25")).await
        });
    }

    let mut successes = 0;

    while let Some(result) = tasks.join_next().await {
        match result? {
            Ok(()) => successes += 1,
            Err(LedgerError::InsufficientFunds { .. }) => {}
            Err(error) => return Err(anyhow!("Unexpected failure: {error}"))
        }
    }

    let balances: Vec<Decimal> = account_ids.iter().map(|&id| balance_of(&engine, id)).collect::<Result<_>>()?;
    let total_after: Decimal = balances.iter().copied().sum();

    assert_eq!(total_after, total_before);
    assert!(balances.iter().all(|balance| *balance >= Decimal::ZERO));
    assert_eq!(engine.storage().len(), entries_before + successes);

    Ok(())
}

#[tokio::test]
async fn test_lock_timeout_surfaces_as_transient_failure() -> Result<()> {
    let engine = LedgerEngine::new(Arc::new(MemoryStorage::new()))
        .with_id_generator(Arc::new(SequentialIdGenerator::new()))
        .with_config(EngineConfig::new().with_lock_timeout(Duration::from_millis(25)));
    let account = engine.open_account(1, AccountType::Savings).await?;

    let held = engine.locks().acquire(&[account.account_id], Duration::from_millis(25)).await?;
    let result = engine.deposit(account.account_id, money("10"), Category::CashDeposit).await;

    assert!(matches!(result, Err(LedgerError::LockTimeout { .. })));
    assert_eq!(result.err().map(|error| error.is_retryable()), Some(true));
    assert!(engine.storage().is_empty());

    drop(held);

    engine.deposit(account.account_id, money("10"), Category::CashDeposit).await?;
    assert_eq!(balance_of(&engine, account.account_id)?, money("10"));

    Ok(())
}

#[tokio::test]
async fn test_close_account_lifecycle() -> Result<()> {
    let engine = create_engine();
    let account = funded_account(&engine, 1, "5.00").await?;

    let funded = engine.close_account(account.account_id).await;
    assert!(matches!(funded, Err(LedgerError::BalanceNotZero { .. })));

    engine.withdraw(account.account_id, money("5.00"), "Card Purchase: 9999", Category::CardPurchase).await?;
    let closed = engine.close_account(account.account_id).await?;
    assert_eq!(closed.status(), AccountStatus::Closed);

    let deposit = engine.deposit(account.account_id, money("1"), Category::CashDeposit).await;
    let again = engine.close_account(account.account_id).await;
    assert!(matches!(deposit, Err(LedgerError::AccountClosed { .. })));
    assert!(matches!(again, Err(LedgerError::AccountClosed { .. })));

    assert_eq!(engine.accounts_by_owner(1, Some(AccountStatus::Closed)).len(), 1);
    assert!(engine.accounts_by_owner(1, Some(AccountStatus::Active)).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_history_pages_and_validates() -> Result<()> {
    let engine = create_engine()
        .with_config(EngineConfig::new().with_page_sizes(2, 3));
    let account = engine.open_account(1, AccountType::Savings).await?;

    for amount in ["1", "2", "3", "4", "5"] {
        engine.deposit(account.account_id, money(amount), Category::CashDeposit).await?;
    }

    let first = engine.history(account.account_id, 0, None)?;
    assert_eq!(first.page_size, 2);
    assert_eq!(first.total_pages(), 3);
    assert_eq!(first.items.iter().map(|entry| entry.amount).collect::<Vec<_>>(), vec![money("5"), money("4")]);

    let last = engine.history(account.account_id, 1, Some(3))?;
    assert_eq!(last.items.iter().map(|entry| entry.amount).collect::<Vec<_>>(), vec![money("2"), money("1")]);

    assert_eq!(engine.history(account.account_id, 0, None)?, first);
    assert!(matches!(engine.history(99, 0, None), Err(LedgerError::AccountNotFound { .. })));
    assert!(matches!(engine.history(account.account_id, 0, Some(0)), Err(LedgerError::InvalidQuery { .. })));
    assert!(matches!(engine.history(account.account_id, 0, Some(4)), Err(LedgerError::InvalidQuery { .. })));

    Ok(())
}

#[tokio::test]
async fn test_search_filters_by_date_direction_and_category() -> Result<()> {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 1, 23, 59, 0).unwrap()));
    let engine = create_engine().with_clock(clock.clone());
    let account = engine.open_account(1, AccountType::Savings).await?;
    let other = engine.open_account(2, AccountType::Savings).await?;

    engine.deposit(account.account_id, money("100"), Category::CashDeposit).await?;
    clock.advance(ChronoDuration::minutes(2));
    engine.deposit(other.account_id, money("50"), Category::CardDeposit).await?;
    engine.transfer(other.account_id, account.account_id, money("20")).await?;
    clock.advance(ChronoDuration::days(2));
    engine.withdraw(account.account_id, money("10"), "Card Purchase: 1234", Category::CardPurchase).await?;

    let day = |d: u32| NaiveDate::from_ymd_opt(2026, 5, d).ok_or_else(|| anyhow!("Invalid date"));

    let everything = engine.search(account.account_id, &SearchFilter::new())?;
    assert_eq!(everything.len(), 3);
    assert_eq!(everything[0].category, Category::CardPurchase);

    let may_first = engine.search(account.account_id, &SearchFilter::new().from_date(day(1)?).to_date(day(1)?))?;
    assert_eq!(may_first.len(), 1);
    assert_eq!(may_first[0].category, Category::CashDeposit);

    let from_second = engine.search(account.account_id, &SearchFilter::new().from_date(day(2)?))?;
    assert_eq!(from_second.len(), 2);

    let received = engine.search(account.account_id, &SearchFilter::new().direction(Direction::Received))?;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].source_account, other.account_id);

    let sent = engine.search(account.account_id, &SearchFilter::new().direction(Direction::Sent))?;
    assert_eq!(sent.len(), 2);

    let purchases = engine.search(account.account_id, &SearchFilter::new().category(Category::CardPurchase).to_date(day(2)?))?;
    assert!(purchases.is_empty());

    let inverted = engine.search(account.account_id, &SearchFilter::new().from_date(day(3)?).to_date(day(1)?));
    assert!(matches!(inverted, Err(LedgerError::InvalidQuery { .. })));

    assert!(engine.search(99, &SearchFilter::new())?.is_empty());
    assert_eq!(engine.search(account.account_id, &SearchFilter::new())?, everything);

    Ok(())
}
