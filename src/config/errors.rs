use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("Configuration error: [{name}] has an invalid value [{value}]")]
    InvalidValue {
        name: &'static str,
        value: String
    },
    #[error("Configuration error: [{name}] {reason}")]
    OutOfRange {
        name: &'static str,
        reason: &'static str
    }
}
