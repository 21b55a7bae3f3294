//! License verification with the semantic checks layered on top.
//!
//! A signature can be valid on an expired license, and an expired license can
//! carry a forged signature. Both facts are computed independently and both
//! are reported.

use crate::error::LicenseResult;
use crate::payload::LicensePayload;
use crate::portable::PortableLicense;
use crate::signing::verify;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of verifying a license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// The signature matches the payload and public key.
    pub signature_valid: bool,
    /// The payload's `expires` is not in the future, or cannot be read.
    pub expired: bool,
    /// The payload decoded as JSON, if it is JSON at all.
    pub payload: Option<serde_json::Value>,
}

impl VerificationReport {
    /// True when the signature is valid and the license has not expired.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.signature_valid && !self.expired
    }
}

/// Verifies `license` against `public_key` and evaluates expiry at `now`.
///
/// # Errors
///
/// Only structurally malformed key or signature bytes are errors; see
/// [`verify`].
pub fn verify_license(
    license: &PortableLicense,
    public_key: &[u8],
    now: DateTime<Utc>,
) -> LicenseResult<VerificationReport> {
    let signature_valid = verify(&license.payload, &license.signature, public_key)?;

    let payload: Option<serde_json::Value> = serde_json::from_slice(&license.payload).ok();
    let expires = payload
        .as_ref()
        .and_then(|p| p.get("expires"))
        .and_then(|e| e.as_str())
        .and_then(|e| DateTime::parse_from_rfc3339(e).ok())
        .map(|e| e.with_timezone(&Utc));

    Ok(VerificationReport {
        signature_valid,
        expired: expires.is_none_or(|e| now >= e),
        payload,
    })
}

/// Compares the payload's bound fingerprint with the running machine's,
/// ignoring hex case.
#[must_use]
pub fn check_fingerprint(payload: &LicensePayload, machine_fingerprint: &str) -> bool {
    payload.fingerprint_id().eq_ignore_ascii_case(machine_fingerprint)
}
