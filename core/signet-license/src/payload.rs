//! The signed license payload.
//!
//! Field names and layout are shared with the desktop client, which reads
//! `fingerprint.fingerprint_id` from the decoded payload.

use crate::canonical;
use crate::error::{LicenseError, LicenseResult};
use crate::validation::{MAX_VALIDITY_DAYS, MIN_VALIDITY_DAYS, validate_fingerprint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// License edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edition {
    Standard,
    Pro,
    Enterprise,
    Basic,
}

impl Edition {
    /// Every edition, in display order.
    pub const ALL: [Edition; 4] = [Self::Basic, Self::Standard, Self::Pro, Self::Enterprise];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Pro => "Pro",
            Self::Enterprise => "Enterprise",
            Self::Basic => "Basic",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Edition {
    type Err = LicenseError;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| {
                LicenseError::Validation(format!(
                    "edition must be one of Standard, Pro, Enterprise, Basic (got {s:?})"
                ))
            })
    }
}

/// The machine a license is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintClaim {
    pub fingerprint_id: String,
}

/// The decoded license payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensePayload {
    /// Signing key id (advisory reference).
    pub kid: String,
    pub customer: String,
    pub edition: Edition,
    #[serde(with = "rfc3339_secs")]
    pub issued_at: DateTime<Utc>,
    #[serde(with = "rfc3339_secs")]
    pub expires: DateTime<Utc>,
    pub validity_days: u32,
    pub seats: u32,
    pub notes: Option<String>,
    pub fingerprint: FingerprintClaim,
}

impl LicensePayload {
    /// Returns the bound fingerprint id.
    #[must_use]
    pub fn fingerprint_id(&self) -> &str {
        &self.fingerprint.fingerprint_id
    }

    /// Returns true if `now` is at or past the expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires
    }

    /// Checks the payload's internal consistency: `expires > issued_at`,
    /// `validity_days` in range and equal to the whole days between them,
    /// `seats >= 1` and a well-formed fingerprint.
    pub fn check(&self) -> LicenseResult<()> {
        if self.expires <= self.issued_at {
            return Err(LicenseError::Validation(
                "expires must be after issued_at".to_string(),
            ));
        }
        if !(MIN_VALIDITY_DAYS..=MAX_VALIDITY_DAYS).contains(&self.validity_days) {
            return Err(LicenseError::Validation(format!(
                "validity_days must be between {MIN_VALIDITY_DAYS} and {MAX_VALIDITY_DAYS}"
            )));
        }
        let span = self.expires - self.issued_at;
        if span != chrono::Duration::days(i64::from(self.validity_days)) {
            return Err(LicenseError::Validation(format!(
                "validity_days {} does not match expires - issued_at ({} days)",
                self.validity_days,
                span.num_days()
            )));
        }
        if self.seats < 1 {
            return Err(LicenseError::Validation("seats must be at least 1".to_string()));
        }
        if !validate_fingerprint(self.fingerprint_id()) {
            return Err(LicenseError::Validation(
                "fingerprint_id must be 16 hexadecimal characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Produces the canonical bytes that get signed.
    pub fn canonical_bytes(&self) -> LicenseResult<Vec<u8>> {
        canonical::encode_serialize(self)
    }

    /// Decodes a payload from canonical JSON bytes.
    pub fn from_canonical(bytes: &[u8]) -> LicenseResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| LicenseError::InvalidPayload(format!("invalid payload JSON: {e}")))
    }
}

/// RFC 3339 timestamps with whole seconds and a numeric `+00:00` offset.
mod rfc3339_secs {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, false))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
