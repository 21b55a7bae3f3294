//! Field validation for license requests.
//!
//! Runs before any key is loaded or anything is signed.

use crate::error::{LicenseError, LicenseResult};
use crate::payload::{Edition, FingerprintClaim, LicensePayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shortest allowed license term.
pub const MIN_VALIDITY_DAYS: u32 = 1;

/// Longest allowed license term (ten years).
pub const MAX_VALIDITY_DAYS: u32 = 3650;

/// Longest allowed customer name.
pub const MAX_CUSTOMER_LENGTH: usize = 255;

/// Length of a machine fingerprint id in hex characters.
pub const FINGERPRINT_LENGTH: usize = 16;

/// Returns true for exactly 16 hex characters (either case).
#[must_use]
pub fn validate_fingerprint(fingerprint_id: &str) -> bool {
    fingerprint_id.len() == FINGERPRINT_LENGTH && fingerprint_id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// An unvalidated request to issue a license, as received from a caller.
///
/// Numeric fields are wide and `edition` is free text so that out-of-range
/// input reaches [`LicenseRequest::validate`] instead of failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseRequest {
    pub key_id: String,
    pub customer: String,
    pub edition: String,
    pub validity_days: i64,
    pub seats: i64,
    #[serde(default)]
    pub notes: Option<String>,
    pub fingerprint_id: String,
}

/// A request whose fields have all been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub key_id: String,
    pub customer: String,
    pub edition: Edition,
    pub validity_days: u32,
    pub seats: u32,
    pub notes: Option<String>,
    pub fingerprint_id: String,
}

impl LicenseRequest {
    /// Checks every field and returns the typed request.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Validation`] naming the first bad field.
    pub fn validate(&self) -> LicenseResult<ValidatedRequest> {
        if self.key_id.trim().is_empty() {
            return Err(LicenseError::Validation("key_id is required".to_string()));
        }

        let customer = self.customer.trim();
        if customer.is_empty() {
            return Err(LicenseError::Validation("customer is required".to_string()));
        }
        if customer.chars().count() > MAX_CUSTOMER_LENGTH {
            return Err(LicenseError::Validation(format!(
                "customer must be at most {MAX_CUSTOMER_LENGTH} characters"
            )));
        }

        let edition: Edition = self.edition.parse()?;

        let validity_days = u32::try_from(self.validity_days)
            .ok()
            .filter(|d| (MIN_VALIDITY_DAYS..=MAX_VALIDITY_DAYS).contains(d))
            .ok_or_else(|| {
                LicenseError::Validation(format!(
                    "validity_days must be between {MIN_VALIDITY_DAYS} and {MAX_VALIDITY_DAYS}"
                ))
            })?;

        let seats = u32::try_from(self.seats)
            .ok()
            .filter(|s| *s >= 1)
            .ok_or_else(|| LicenseError::Validation("seats must be at least 1".to_string()))?;

        if !validate_fingerprint(&self.fingerprint_id) {
            return Err(LicenseError::Validation(
                "fingerprint_id must be 16 hexadecimal characters".to_string(),
            ));
        }

        Ok(ValidatedRequest {
            key_id: self.key_id.clone(),
            customer: customer.to_string(),
            edition,
            validity_days,
            seats,
            notes: self.notes.clone().filter(|n| !n.trim().is_empty()),
            fingerprint_id: self.fingerprint_id.clone(),
        })
    }
}

impl ValidatedRequest {
    /// Builds the payload for a license issued at `issued_at`.
    ///
    /// `issued_at` is truncated to whole seconds so that the stored row and
    /// the signed timestamp agree.
    pub fn into_payload(self, issued_at: DateTime<Utc>) -> LicenseResult<LicensePayload> {
        use chrono::SubsecRound;

        let issued_at = issued_at.trunc_subsecs(0);
        let expires = issued_at
            .checked_add_signed(chrono::Duration::days(i64::from(self.validity_days)))
            .ok_or_else(|| LicenseError::Validation("expiry is out of range".to_string()))?;

        let payload = LicensePayload {
            kid: self.key_id,
            customer: self.customer,
            edition: self.edition,
            issued_at,
            expires,
            validity_days: self.validity_days,
            seats: self.seats,
            notes: self.notes,
            fingerprint: FingerprintClaim {
                fingerprint_id: self.fingerprint_id,
            },
        };
        payload.check()?;
        Ok(payload)
    }
}
