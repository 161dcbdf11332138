//! JSON serialization helpers for deterministic output.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(serde_json::Error),

    /// UTF-8 encoding error.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serializes a value to pretty JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable<T: Serialize>(value: &T) -> Result<String, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let mut json = String::from_utf8(buffer)?;
    json.push('\n');
    Ok(json)
}

/// Same as [`to_json_stable`], as bytes ready for a file write.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    to_json_stable(value).map(String::into_bytes)
}

/// Deserializes JSON from bytes.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn slots_are_written_sorted_and_indented() {
        let mut slots = BTreeMap::new();
        slots.insert("__memorizerRefresh", "r");
        slots.insert("__memorizerAccess", "a");

        let json = to_json_stable(&slots).expect("serialization should work");
        assert_eq!(
            json,
            "{\n  \"__memorizerAccess\": \"a\",\n  \"__memorizerRefresh\": \"r\"\n}\n"
        );
    }

    #[test]
    fn bytes_read_back() {
        let mut slots = BTreeMap::new();
        slots.insert("__memorizerAccess".to_string(), "a".to_string());

        let bytes = to_json_stable_bytes(&slots).expect("serialization should work");
        let restored: BTreeMap<String, String> =
            from_json_bytes(&bytes).expect("deserialization should work");
        assert_eq!(restored, slots);
    }

    #[test]
    fn garbage_is_a_deserialize_error() {
        let result = from_json_bytes::<BTreeMap<String, String>>(b"{\"broken\": ");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }
}
