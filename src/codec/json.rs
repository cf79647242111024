//! JSON codec using `serde_json`.
//!
//! The wire bodies use the protocol's `fastjson` serialization scheme, so
//! the serialization capability is plain JSON.

use serde_json::Value;

use crate::error::Result;

/// JSON codec for payload bodies.
///
/// Implemented as a marker struct with static methods so codec selection is
/// a compile-time concern.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to JSON bytes.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    /// Decode JSON bytes to a value.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode JSON bytes to a dynamic value, falling back to a string of
    /// the raw bytes when they are not valid JSON.
    pub fn decode_lenient(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }
}
