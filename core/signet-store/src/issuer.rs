//! The license issuance workflow.
//!
//! `Requested → Validated → Signed → Persisted`. Validation runs before the
//! database is touched; key resolution, signing and the insert share one
//! `IMMEDIATE` transaction, so a failure at any step leaves no row and a
//! concurrent retire cannot slip in between.

use crate::error::StoreResult;
use crate::key_store::{KeyStore, load_private_key_in};
use crate::license_store::{self, LicenseRecord};
use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;
use signet_license::{LicenseRequest, PortableLicense, sign};
use std::fmt;
use tracing::{debug, info, info_span};

/// Stage reached by an issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceState {
    Requested,
    Validated,
    Signed,
    Persisted,
}

impl fmt::Display for IssuanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Requested => "requested",
            Self::Validated => "validated",
            Self::Signed => "signed",
            Self::Persisted => "persisted",
        })
    }
}

/// A persisted license together with its distributable file.
#[derive(Debug, Clone)]
pub struct IssuedLicense {
    pub record: LicenseRecord,
    pub file: PortableLicense,
}

/// Issues licenses with keys from a [`KeyStore`].
#[derive(Clone)]
pub struct Issuer {
    keys: KeyStore,
}

impl Issuer {
    pub fn new(keys: KeyStore) -> Self {
        Self { keys }
    }

    /// Issues a license with the current time as `issued_at`.
    pub fn issue(&self, request: &LicenseRequest) -> StoreResult<IssuedLicense> {
        self.issue_at(request, Utc::now())
    }

    /// Issues a license as of `now`.
    ///
    /// # Errors
    ///
    /// - `License(Validation)` for bad fields, before any storage access
    /// - `NotFound` for an unknown or retired key
    /// - `KeyUnavailable` when the private key cannot be unsealed
    pub fn issue_at(&self, request: &LicenseRequest, now: DateTime<Utc>) -> StoreResult<IssuedLicense> {
        let span = info_span!("issue_license", key_id = %request.key_id, state = %IssuanceState::Requested);
        let _enter = span.enter();

        let validated = request.validate()?;
        let payload = validated.into_payload(now)?;
        span.record("state", tracing::field::display(IssuanceState::Validated));
        debug!("request validated");

        let mut conn = self.keys.db.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let record = {
            let private_key = load_private_key_in(&tx, &self.keys.master_key, &payload.kid)?;
            let canonical = payload.canonical_bytes()?;
            let signature = sign(&canonical, &private_key);
            LicenseRecord::new(&payload, canonical, signature.to_vec())
        };
        span.record("state", tracing::field::display(IssuanceState::Signed));

        license_store::insert(&tx, &record)?;
        tx.commit()?;
        span.record("state", tracing::field::display(IssuanceState::Persisted));

        info!(
            license_id = %record.id,
            key_id = %record.key_id,
            edition = %record.edition,
            seats = record.seats,
            "issued license"
        );

        let file = record.portable();
        Ok(IssuedLicense { record, file })
    }
}
