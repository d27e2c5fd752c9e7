//! Response shapes shared by several endpoints.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Acknowledgement returned by create and update calls.
///
/// The backend does not promise a full record back, so every field is
/// optional and anything that is not an object is read as an empty
/// acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedRecord {
    /// Server-assigned id, when the backend reports one.
    pub id: Option<i64>,
    /// Human-readable message, when the backend sends one.
    pub message: Option<String>,
}

impl CreatedRecord {
    /// Read an acknowledgement out of an arbitrary JSON body.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        let id = map.get("id").and_then(|id| match id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        let message = map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned);
        Self { id, message }
    }
}

impl<'de> Deserialize<'de> for CreatedRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}
