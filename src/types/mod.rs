mod errors;
mod monetary;

pub use errors::MonetaryError;
pub use monetary::{deserialize_optional_monetary, format_monetary, has_valid_scale, parse_monetary, MAX_SCALE};

pub type AccountId = u64;
pub type OwnerId = u64;
pub type ReferenceId = String;

/// Number of digits in an externally visible account number.
pub const ACCOUNT_NUMBER_DIGITS: usize = 12;
