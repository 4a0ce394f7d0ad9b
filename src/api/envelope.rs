use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

/// Response envelope used by the backend. Two shapes are in use:
/// `{ success, data }` and `{ status, data, message }`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T = Value> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decodes an envelope from an already parsed body. Bodies that are not JSON
    /// objects produce an empty envelope.
    ///
    /// # Errors
    /// Returns an error if `data` does not match `T`.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_object() {
            serde_json::from_value(value)
        } else {
            Ok(Self {
                success: None,
                status: None,
                data: None,
                message: None,
            })
        }
    }
}

impl<T> Envelope<T> {
    /// False when either flag reports a failure; missing flags count as success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.success.unwrap_or(true) && self.status.map_or(true, |s| (200..300).contains(&s))
    }

    /// Message to show when the envelope reports a failure.
    #[must_use]
    pub fn failure_message(&self) -> String {
        self.message
            .clone()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "Request failed.".to_string())
    }
}
