use crate::types::errors::MonetaryError;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;

/// Largest number of fractional digits an amount may carry.
pub const MAX_SCALE: u32 = 4;

/// Parses a human supplied amount such as `"100.50"` into a fixed-point decimal.
///
/// Leading and trailing whitespace is ignored. Trailing zeros do not count
/// against [`MAX_SCALE`], so `"1.000000"` is accepted as `1`.
pub fn parse_monetary(value: &str) -> Result<Decimal, MonetaryError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(MonetaryError::InvalidFormat("Value is an empty string".to_string()));
    }

    let parsed = Decimal::from_str(value).map_err(|error| {
        MonetaryError::InvalidFormat(format!("Value [{value}] is not a decimal: {error}"))
    })?;

    if !has_valid_scale(parsed) {
        return Err(MonetaryError::TooManyDecimalPlaces(value.to_string()));
    }

    Ok(parsed.normalize())
}

pub fn has_valid_scale(value: Decimal) -> bool {
    value.normalize().scale() <= MAX_SCALE
}

/// Renders an amount with exactly [`MAX_SCALE`] fractional digits.
pub fn format_monetary(value: Decimal) -> String {
    format!("{:.4}", value)
}

/// Serde helper for optional CSV amount columns; an empty cell reads as `None`.
pub fn deserialize_optional_monetary<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.trim().is_empty() => parse_monetary(&value).map(Some).map_err(de::Error::custom),
        _ => Ok(None)
    }
}
