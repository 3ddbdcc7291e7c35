mod history;
mod ledger_engine;
#[cfg(test)]
mod tests;

pub use history::SearchFilter;
pub use ledger_engine::LedgerEngine;
