//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// A request field is missing or out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Key or signature bytes have the wrong shape.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Portable license file could not be decoded.
    #[error("malformed license file: {0}")]
    MalformedFile(String),

    /// Payload contains a value with no canonical form.
    #[error("payload cannot be canonicalized: {0}")]
    Canonical(String),

    /// The RNG failed while generating a key pair.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Payload JSON is malformed or missing required fields.
    #[error("invalid license payload: {0}")]
    InvalidPayload(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error while reading or writing a license file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
