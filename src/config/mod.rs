mod errors;

use std::str::FromStr;
use std::time::Duration;

pub use errors::ConfigError;

pub const LOCK_TIMEOUT_VARIABLE: &str = "LEDGER_LOCK_TIMEOUT_MS";
pub const ACCOUNT_NUMBER_ATTEMPTS_VARIABLE: &str = "LEDGER_ACCOUNT_NUMBER_ATTEMPTS";
pub const DEFAULT_PAGE_SIZE_VARIABLE: &str = "LEDGER_DEFAULT_PAGE_SIZE";
pub const MAX_PAGE_SIZE_VARIABLE: &str = "LEDGER_MAX_PAGE_SIZE";
pub const RESOLVER_CACHE_CAPACITY_VARIABLE: &str = "LEDGER_RESOLVER_CACHE_CAPACITY";

/// Tunables of the ledger engine.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EngineConfig {
    /// Longest an operation waits for its account locks before failing as transient.
    pub lock_timeout: Duration,
    /// Draws allowed when looking for an unused account number.
    pub account_number_attempts: u32,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Entries kept in the account number resolution cache.
    pub resolver_cache_capacity: u64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            account_number_attempts: 16,
            default_page_size: 10,
            max_page_size: 100,
            resolver_cache_capacity: 10_000
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn with_account_number_attempts(mut self, attempts: u32) -> Self {
        self.account_number_attempts = attempts;
        self
    }

    pub fn with_page_sizes(mut self, default_page_size: usize, max_page_size: usize) -> Self {
        self.default_page_size = default_page_size;
        self.max_page_size = max_page_size;
        self
    }

    pub fn with_resolver_cache_capacity(mut self, capacity: u64) -> Self {
        self.resolver_cache_capacity = capacity;
        self
    }

    /// Reads overrides from the process environment, keeping defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(millis) = parse_variable::<u64, _>(&lookup, LOCK_TIMEOUT_VARIABLE)? {
            config.lock_timeout = Duration::from_millis(millis);
        }
        if let Some(attempts) = parse_variable(&lookup, ACCOUNT_NUMBER_ATTEMPTS_VARIABLE)? {
            config.account_number_attempts = attempts;
        }
        if let Some(size) = parse_variable(&lookup, DEFAULT_PAGE_SIZE_VARIABLE)? {
            config.default_page_size = size;
        }
        if let Some(size) = parse_variable(&lookup, MAX_PAGE_SIZE_VARIABLE)? {
            config.max_page_size = size;
        }
        if let Some(capacity) = parse_variable(&lookup, RESOLVER_CACHE_CAPACITY_VARIABLE)? {
            config.resolver_cache_capacity = capacity;
        }

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_timeout.is_zero() {
            return Err(ConfigError::OutOfRange { name: LOCK_TIMEOUT_VARIABLE, reason: "must be greater than zero" });
        }
        if self.account_number_attempts == 0 {
            return Err(ConfigError::OutOfRange { name: ACCOUNT_NUMBER_ATTEMPTS_VARIABLE, reason: "must be greater than zero" });
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(ConfigError::OutOfRange { name: DEFAULT_PAGE_SIZE_VARIABLE, reason: "page sizes must be greater than zero" });
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::OutOfRange { name: DEFAULT_PAGE_SIZE_VARIABLE, reason: "must not exceed the maximum page size" });
        }

        Ok(())
    }
}

fn parse_variable<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(None)
    }
}
