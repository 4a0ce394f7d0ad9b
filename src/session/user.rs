use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cached user record written at login. Only `id` and `user_type` are read by
/// this crate; anything else the backend sends is kept as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub user_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, user_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_type: user_type.into(),
            extra: Map::new(),
        }
    }

    /// Case-insensitive role check against `user_type`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.user_type.eq_ignore_ascii_case(role.trim())
    }
}

// ids come back as numbers from some endpoints and as strings from others
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
