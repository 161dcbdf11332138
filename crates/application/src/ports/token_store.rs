//! Token store port
//!
//! Defines the interface for durable access/refresh token persistence.

use memorizer_domain::{StoredTokens, TokenPair};

/// Errors that can occur during token storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No location is available for durable storage.
    #[error("Could not determine token storage location")]
    NoStorageDir,
}

/// Durable key-value storage for the two token slots.
///
/// Calls are synchronous, like browser local storage: they are only ever
/// made between the suspension points of an authentication operation.
pub trait TokenStore: Send + Sync {
    /// Overwrites both slots.
    ///
    /// Callers never observe one slot updated without the other.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens cannot be written.
    fn save(&self, tokens: &TokenPair) -> Result<(), StorageError>;

    /// Returns whatever is currently persisted.
    ///
    /// Absent slots are `None`, never an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage exists but cannot be read.
    fn load(&self) -> Result<StoredTokens, StorageError>;

    /// Removes both slots. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be modified.
    fn clear(&self) -> Result<(), StorageError>;
}
