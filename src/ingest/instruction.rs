use rust_decimal::Decimal;
use serde::Deserialize;

use crate::engine::LedgerEngine;
use crate::ingest::InstructionError;
use crate::models::{AccountType, Category};
use crate::storage::Storage;
use crate::types::{deserialize_optional_monetary, AccountId, OwnerId};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionType {
    Open,
    Deposit,
    Withdraw,
    Transfer,
    Close
}

/// One row of an instruction file.
///
/// Columns that an instruction type does not use are left empty. Deposits
/// default to `CASH_DEPOSIT`, withdrawals to `CARD_PURCHASE`.
#[derive(Debug, Clone, Deserialize)]
pub struct Instruction {
    #[serde(rename = "type")]
    pub instruction_type: InstructionType,
    /// Owner of the account to open.
    pub owner: Option<OwnerId>,
    /// Account acted on; the sender for transfers.
    pub account: Option<AccountId>,
    /// Receiving account id for transfers.
    pub target: Option<AccountId>,
    #[serde(default, deserialize_with = "deserialize_optional_monetary")]
    pub amount: Option<Decimal>,
    pub category: Option<Category>,
    pub description: Option<String>,
    /// Type of the account to open, `SAVINGS` when empty.
    #[serde(default)]
    pub account_type: Option<AccountType>
}

impl Instruction {
    /// Runs the instruction through the engine.
    pub async fn apply<S: Storage>(&self, engine: &LedgerEngine<S>) -> Result<(), InstructionError> {
        match self.instruction_type {
            InstructionType::Open => {
                let account_type = self.account_type.unwrap_or_default();
                engine.open_account(self.require(self.owner, "owner")?, account_type).await?;
            }
            InstructionType::Deposit => {
                let category = self.category.unwrap_or(Category::CashDeposit);
                engine.deposit(self.require(self.account, "account")?, self.require(self.amount, "amount")?, category).await?;
            }
            InstructionType::Withdraw => {
                let category = self.category.unwrap_or(Category::CardPurchase);
                let description = self.description.clone().unwrap_or_else(|| "Withdrawal".to_string());
                engine.withdraw(self.require(self.account, "account")?, self.require(self.amount, "amount")?, description, category).await?;
            }
            InstructionType::Transfer => {
                engine.transfer(
                    self.require(self.account, "account")?,
                    self.require(self.target, "target")?,
                    self.require(self.amount, "amount")?
                ).await?;
            }
            InstructionType::Close => {
                engine.close_account(self.require(self.account, "account")?).await?;
            }
        }

        Ok(())
    }

    fn require<T>(&self, value: Option<T>, field: &'static str) -> Result<T, InstructionError> {
        value.ok_or(InstructionError::MissingField { instruction_type: self.instruction_type, field })
    }
}
