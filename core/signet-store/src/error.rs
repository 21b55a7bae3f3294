//! Error types for the storage layer.

use signet_license::LicenseError;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in key and license storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Key or license not found (or soft-deleted).
    #[error("not found: {0}")]
    NotFound(String),

    /// A signing key with this id already exists.
    #[error("key id already exists: {0}")]
    DuplicateKeyId(String),

    /// The key is referenced by an active license.
    #[error("key {0} is in use by active licenses")]
    KeyInUse(String),

    /// The private key could not be unsealed, or there is none.
    #[error("private key unavailable for {0}")]
    KeyUnavailable(String),

    /// Sealing a private key failed.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Invalid input to a store operation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Licensing error (validation, key generation, canonicalization).
    #[error(transparent)]
    License(#[from] LicenseError),

    /// Another thread panicked while holding the connection.
    #[error("database connection poisoned")]
    LockPoisoned,
}
