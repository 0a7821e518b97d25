//! Value format for stored envelopes.
//!
//! Entries are stored as JSON so that any `serde` value, including
//! `serde_json::Value` bodies, survives the round trip through an opaque
//! byte store.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use subcache_core::Raw;
use thiserror::Error;

/// Errors raised while encoding or decoding a stored entry.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The value could not be serialized.
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    /// The stored bytes could not be deserialized into the requested type.
    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// JSON format (default and only format).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFormat;

impl JsonFormat {
    /// Serializes `value` into raw bytes.
    pub fn encode<T>(&self, value: &T) -> Result<Raw, FormatError>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| FormatError::Serialize(Box::new(e)))
    }

    /// Deserializes raw bytes into `T`.
    pub fn decode<T>(&self, data: &[u8]) -> Result<T, FormatError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(data).map_err(|e| FormatError::Deserialize(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reports_deserialize_errors() {
        let err = JsonFormat.decode::<u32>(b"\"nope\"").unwrap_err();
        assert!(matches!(err, FormatError::Deserialize(_)));
    }
}
