//! Durable key-value storage for the session credential.
//!
//! The platform contract uses exactly two keys: `auth_token` (opaque string)
//! and `user` (serialized user JSON). No other keys are part of this core's
//! contract.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Storage keys for session data.
pub mod keys {
    /// Key for the opaque bearer token.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// Key for the serialized user record (JSON).
    pub const USER: &str = "user";
}

/// Errors raised by durable storage.
///
/// Error details are carried as strings so the type stays `Clone` and can be
/// propagated through shared caches.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Underlying I/O failure.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// The stored data could not be serialized or deserialized.
    #[error("storage serialization error: {0}")]
    Serde(String),
}

/// Device-local durable key-value storage.
///
/// Implementations must be safe to share across tasks; the session store is
/// the sole writer of the session keys, but the gateway's 401 handler may
/// clear them from another call site.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value durably.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
