use crate::ingest::InstructionType;
use crate::models::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstructionError {
    #[error("Instruction [{instruction_type:?}] is missing the [{field}] column")]
    MissingField {
        instruction_type: InstructionType,
        field: &'static str
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError)
}
