//! Lenient readers for loosely typed backend fields.
//!
//! The backend stores form input as typed by staff. Optional columns come back
//! as `null`, missing, or `""`, and free-form optical values may come back as
//! numbers. These helpers normalise such fields at the deserialization edge.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::Money;

/// Render any JSON scalar as text. `null` becomes the empty string.
#[must_use]
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Deserialize a string field that may arrive as a number or `null`.
///
/// # Errors
///
/// Propagates errors from the underlying deserializer.
pub fn opaque_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(value_to_text).unwrap_or_default())
}

/// Deserialize an optional value where blank text means "absent".
///
/// # Errors
///
/// Returns an error if non-blank text fails to parse as `T`.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = value.as_ref().map(value_to_text).unwrap_or_default();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(serde::de::Error::custom)
}

/// Deserialize optional free text, collapsing blank strings to `None`.
///
/// # Errors
///
/// Propagates errors from the underlying deserializer.
pub fn blank_text_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = opaque_text(deserializer)?;
    Ok((!text.trim().is_empty()).then_some(text))
}

/// Deserialize a value that falls back to `T::default()` when absent, blank,
/// or not understood.
///
/// # Errors
///
/// Propagates errors from the underlying deserializer.
pub fn parse_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    let text = opaque_text(deserializer)?;
    Ok(text.trim().parse().unwrap_or_default())
}

/// Deserialize a reported amount that may arrive as a number, numeric text,
/// or `null`. Anything unreadable or negative reads as zero.
///
/// # Errors
///
/// Propagates errors from the underlying deserializer.
pub fn lenient_money<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    let text = opaque_text(deserializer)?;
    Ok(text.trim().parse::<Decimal>().map_or(Money::ZERO, Money::new))
}
