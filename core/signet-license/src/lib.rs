//! Canonical license payloads, Ed25519 signing and the portable license file.
//!
//! This crate holds everything that must behave identically on the issuing
//! server and on the offline desktop client:
//! - Deterministic payload canonicalization (sorted keys, no whitespace,
//!   integers only)
//! - Ed25519 key material, signing and verification
//! - Field validation for license requests
//! - The two-line portable license file
//! - Machine fingerprints for device binding
//!
//! # Portable File Format
//!
//! Line 1 is `base64(canonical payload)`, line 2 is `base64(signature)`.
//! The signature covers the decoded canonical payload bytes.
//!
//! # Failure Classes
//!
//! A file that cannot be decoded is [`LicenseError::MalformedFile`]; a key or
//! signature of the wrong shape is [`LicenseError::MalformedInput`]; a
//! signature that simply does not match is reported as `false`, never as an
//! error. Expiry and fingerprint checks sit above signature verification and
//! are reported separately.

pub mod canonical;
mod device;
mod error;
mod keys;
mod payload;
mod portable;
mod report;
mod signing;
mod validation;

pub use device::DeviceFingerprint;
pub use error::{LicenseError, LicenseResult};
pub use keys::{PUBLIC_KEY_LENGTH, PrivateKey, PublicKey, SECRET_KEY_LENGTH, SEED_LENGTH, generate_key_pair};
pub use payload::{Edition, FingerprintClaim, LicensePayload};
pub use portable::{FILE_EXTENSION, PortableLicense};
pub use report::{VerificationReport, check_fingerprint, verify_license};
pub use signing::{SIGNATURE_LENGTH, sign, verify};
pub use validation::{
    FINGERPRINT_LENGTH, LicenseRequest, MAX_CUSTOMER_LENGTH, MAX_VALIDITY_DAYS, MIN_VALIDITY_DAYS,
    ValidatedRequest, validate_fingerprint,
};
