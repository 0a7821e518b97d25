//! Error types for store operations.

use thiserror::Error;

use crate::format::FormatError;

/// Error type for store operations.
///
/// The orchestrator never surfaces these to callers of `run_with_cache`: a
/// failing store degrades the call to pass-through. They are returned as-is
/// by the direct `get`/`set`/`delete` API.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal store error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote stores.
    #[error(transparent)]
    Connection(Box<dyn std::error::Error + Send + Sync>),

    /// Envelope serialization or deserialization error.
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl StoreError {
    /// Wraps any error as [`StoreError::Internal`].
    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Internal(Box::new(error))
    }

    /// Wraps any error as [`StoreError::Connection`].
    pub fn connection<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Connection(Box::new(error))
    }
}
