//! SQLite persistence for Signet signing keys and issued licenses.
//!
//! # Architecture
//!
//! - One [`Database`] owns the connection; [`KeyStore`], [`LicenseStore`]
//!   and [`Issuer`] are cheap handles over it
//! - Private keys are sealed with the master key before they are written
//! - Licenses reference keys by id only; the reference is advisory, so old
//!   licenses stay verifiable after their key row is retired
//! - Retiring a key and issuing a license both run in `IMMEDIATE`
//!   transactions, so the in-use check cannot race an issue

mod error;
mod issuer;
mod key_store;
mod license_store;

pub use error::{StoreError, StoreResult};
pub use issuer::{IssuanceState, IssuedLicense, Issuer};
pub use key_store::{ImportOutcome, ImportSummary, KeyImport, KeyStore, MAX_KEY_ID_LENGTH, SigningKeyRecord};
pub use license_store::{LicenseRecord, LicenseStore};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// How long a writer waits for a competing transaction before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared SQLite connection with the Signet schema applied.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) a database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Self::init(conn)
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS signing_keys (
                key_id TEXT PRIMARY KEY,
                public_key_b64 TEXT NOT NULL,
                encrypted_private_key TEXT,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT
            );

            CREATE TABLE IF NOT EXISTS licenses (
                id TEXT PRIMARY KEY,
                key_id TEXT NOT NULL,
                customer TEXT NOT NULL,
                edition TEXT NOT NULL,
                seats INTEGER NOT NULL CHECK (seats >= 1),
                issued_at TEXT NOT NULL,
                expires TEXT NOT NULL,
                validity_days INTEGER NOT NULL CHECK (validity_days BETWEEN 1 AND 3650),
                fingerprint_id TEXT NOT NULL,
                canonical_payload BLOB NOT NULL,
                signature BLOB NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL,
                deleted_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_licenses_active_key
                ON licenses (key_id) WHERE deleted_at IS NULL;

            CREATE TRIGGER IF NOT EXISTS licenses_signed_fields_immutable
            BEFORE UPDATE OF key_id, canonical_payload, signature, issued_at, expires ON licenses
            BEGIN
                SELECT RAISE(ABORT, 'signed license fields are immutable');
            END;
            ",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}
