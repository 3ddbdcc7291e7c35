use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonetaryError {
    #[error("Monetary error: {0}")]
    InvalidFormat(String),
    #[error("Monetary error: [{0}] has more than 4 decimal places")]
    TooManyDecimalPlaces(String)
}
