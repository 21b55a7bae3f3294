//! Issued license records.
//!
//! Rows are written once by [`crate::Issuer`] and never updated apart from
//! soft deletion. The signed columns are additionally guarded by a trigger.

use crate::error::{StoreError, StoreResult};
use crate::{Database, format_ts, parse_ts};
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use signet_license::{Edition, LicensePayload, PortableLicense};
use tracing::info;
use uuid::Uuid;

/// A persisted license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseRecord {
    pub id: Uuid,
    /// Advisory reference to the signing key.
    pub key_id: String,
    pub customer: String,
    pub edition: Edition,
    pub seats: u32,
    pub issued_at: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub validity_days: u32,
    pub fingerprint_id: String,
    /// The exact bytes that were signed.
    pub canonical_payload: Vec<u8>,
    pub signature: Vec<u8>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LicenseRecord {
    /// Builds a record for a freshly signed payload.
    pub(crate) fn new(payload: &LicensePayload, canonical_payload: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            id: Uuid::now_v7(),
            key_id: payload.kid.clone(),
            customer: payload.customer.clone(),
            edition: payload.edition,
            seats: payload.seats,
            issued_at: payload.issued_at,
            expires: payload.expires,
            validity_days: payload.validity_days,
            fingerprint_id: payload.fingerprint_id().to_string(),
            canonical_payload,
            signature,
            notes: payload.notes.clone(),
            created_at: Utc::now().trunc_subsecs(3),
            deleted_at: None,
        }
    }

    /// The distributable file for this license, from the stored bytes.
    #[must_use]
    pub fn portable(&self) -> PortableLicense {
        PortableLicense::new(self.canonical_payload.clone(), self.signature.clone())
    }

    /// Suggested file name for downloads.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("license-{}.{}", self.id, signet_license::FILE_EXTENSION)
    }
}

/// Read and soft-delete access to issued licenses.
#[derive(Clone)]
pub struct LicenseStore {
    db: Database,
}

impl LicenseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns an active license.
    pub fn get(&self, id: Uuid) -> StoreResult<LicenseRecord> {
        let conn = self.db.lock()?;
        conn.query_row(
            &format!("SELECT {LICENSE_COLUMNS} FROM licenses WHERE id = ?1 AND deleted_at IS NULL"),
            params![id.to_string()],
            row_to_license,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("license {id}")))
    }

    /// Lists active licenses, newest first.
    pub fn list(&self) -> StoreResult<Vec<LicenseRecord>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {LICENSE_COLUMNS} FROM licenses WHERE deleted_at IS NULL ORDER BY id DESC"
        ))?;
        let rows = stmt.query_map([], row_to_license)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Soft-deletes a license.
    pub fn delete(&self, id: Uuid) -> StoreResult<()> {
        let conn = self.db.lock()?;
        let changed = conn.execute(
            "UPDATE licenses SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
            params![id.to_string(), format_ts(&Utc::now())],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("license {id}")));
        }
        info!(license_id = %id, "deleted license");
        Ok(())
    }

    /// Counts active licenses that reference `key_id`.
    pub fn count_active_for_key(&self, key_id: &str) -> StoreResult<u64> {
        let conn = self.db.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM licenses WHERE key_id = ?1 AND deleted_at IS NULL",
            params![key_id],
            |row| row.get(0),
        )?;
        Ok(count.unsigned_abs())
    }
}

const LICENSE_COLUMNS: &str = "id, key_id, customer, edition, seats, issued_at, expires, validity_days, \
     fingerprint_id, canonical_payload, signature, notes, created_at, deleted_at";

/// Inserts `record` on an open connection or transaction.
pub(crate) fn insert(conn: &Connection, record: &LicenseRecord) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO licenses (id, key_id, customer, edition, seats, issued_at, expires, validity_days,
                               fingerprint_id, canonical_payload, signature, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            record.id.to_string(),
            record.key_id,
            record.customer,
            record.edition.as_str(),
            record.seats,
            format_ts(&record.issued_at),
            format_ts(&record.expires),
            record.validity_days,
            record.fingerprint_id,
            record.canonical_payload,
            record.signature,
            record.notes,
            format_ts(&record.created_at),
        ],
    )?;
    Ok(())
}

fn row_to_license(row: &rusqlite::Row<'_>) -> rusqlite::Result<LicenseRecord> {
    let conversion = |idx: usize, e: Box<dyn std::error::Error + Send + Sync>| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e)
    };

    let id: String = row.get(0)?;
    let edition: String = row.get(3)?;
    let issued_at: String = row.get(5)?;
    let expires: String = row.get(6)?;
    let created_at: String = row.get(12)?;
    let deleted_at: Option<String> = row.get(13)?;

    Ok(LicenseRecord {
        id: Uuid::parse_str(&id).map_err(|e| conversion(0, Box::new(e)))?,
        key_id: row.get(1)?,
        customer: row.get(2)?,
        edition: edition.parse().map_err(|e: signet_license::LicenseError| conversion(3, Box::new(e)))?,
        seats: row.get(4)?,
        issued_at: parse_ts(5, &issued_at)?,
        expires: parse_ts(6, &expires)?,
        validity_days: row.get(7)?,
        fingerprint_id: row.get(8)?,
        canonical_payload: row.get(9)?,
        signature: row.get(10)?,
        notes: row.get(11)?,
        created_at: parse_ts(12, &created_at)?,
        deleted_at: deleted_at.as_deref().map(|d| parse_ts(13, d)).transpose()?,
    })
}
