mod csv_runner;
mod errors;
mod instruction;

pub use csv_runner::{CsvRunner, RunSummary};
pub use errors::InstructionError;
pub use instruction::{Instruction, InstructionType};
