//! JSON encoding used by the file backend.

use crate::error::CodecResult;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value as compact JSON bytes.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as JSON.
pub fn to_json<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decodes a value from JSON bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON for `T`.
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Deployment {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Type")]
        kind: String,
    }

    #[test]
    fn encodes_field_names() {
        let bytes = to_json(&Deployment {
            name: "redis".into(),
            kind: "GCP".into(),
        })
        .unwrap();
        assert_eq!(bytes, br#"{"Name":"redis","Type":"GCP"}"#);
    }

    #[test]
    fn decode_rejects_garbage() {
        let result: CodecResult<Deployment> = from_json(b"{not json");
        assert!(matches!(result, Err(CodecError::Json(_))));
    }
}
