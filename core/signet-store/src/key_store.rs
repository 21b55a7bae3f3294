//! Persistent store for Ed25519 signing keys.
//!
//! Private keys are stored as a 32-byte seed sealed under the master key,
//! with the key id bound in as associated data. Rows are soft-deleted and key
//! ids are never reused.

use crate::error::{StoreError, StoreResult};
use crate::{Database, format_ts, parse_ts};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::{Deserialize, Serialize};
use signet_crypto::{MasterKey, SealedData, open, seal};
use signet_license::{PrivateKey, PublicKey, generate_key_pair};
use std::sync::Arc;
use tracing::{error, info, warn};
use zeroize::Zeroizing;

/// Longest allowed key id.
pub const MAX_KEY_ID_LENGTH: usize = 255;

/// A signing key row. Never carries private material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKeyRecord {
    pub key_id: String,
    pub public_key: PublicKey,
    /// False for keys imported with only their public half.
    pub has_private_key: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// One key in an import batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyImport {
    pub key_id: String,
    pub public_key_b64: String,
    /// Base64 32-byte seed or 64-byte `seed || public` secret key.
    #[serde(default)]
    pub private_key_b64: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Per-entry result of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub index: usize,
    pub key_id: String,
    pub error: String,
}

/// Totals for an import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub total: usize,
    pub errors: Vec<ImportOutcome>,
}

/// Key lifecycle operations over the shared database.
#[derive(Clone)]
pub struct KeyStore {
    pub(crate) db: Database,
    pub(crate) master_key: Arc<MasterKey>,
}

impl KeyStore {
    pub fn new(db: Database, master_key: Arc<MasterKey>) -> Self {
        Self { db, master_key }
    }

    /// Generates a fresh Ed25519 key pair.
    pub fn generate_key_pair() -> StoreResult<(PublicKey, PrivateKey)> {
        generate_key_pair().map_err(|e| {
            error!(error_class = "key_generation", "key pair generation failed");
            StoreError::from(e)
        })
    }

    /// Generates a key pair and stores it under `key_id`.
    pub fn create(&self, key_id: &str, notes: Option<&str>) -> StoreResult<SigningKeyRecord> {
        validate_key_id(key_id)?;
        let (public_key, private_key) = Self::generate_key_pair()?;
        self.store(key_id, &public_key, &private_key, notes)
    }

    /// Seals `private_key` and inserts a new key row.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKeyId`] if the id exists, including retired ids.
    pub fn store(
        &self,
        key_id: &str,
        public_key: &PublicKey,
        private_key: &PrivateKey,
        notes: Option<&str>,
    ) -> StoreResult<SigningKeyRecord> {
        validate_key_id(key_id)?;
        if private_key.public_key() != *public_key {
            return Err(StoreError::Validation(
                "private key does not match public key".to_string(),
            ));
        }
        let sealed = self.seal_private_key(key_id, private_key)?;
        let now = Utc::now();

        // Other processes may share the database file, so the existence check
        // and the insert are one statement.
        let conn = self.db.lock()?;
        let inserted = conn.execute(
            "INSERT INTO signing_keys (key_id, public_key_b64, encrypted_private_key, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(key_id) DO NOTHING",
            params![key_id, public_key.to_base64(), sealed.to_base64(), notes, format_ts(&now)],
        )?;
        if inserted == 0 {
            return Err(StoreError::DuplicateKeyId(key_id.to_string()));
        }
        info!(key_id, "stored signing key");

        fetch_key(&conn, key_id, false)?.ok_or_else(|| StoreError::NotFound(key_id.to_string()))
    }

    /// Loads and unseals the private key for `key_id`.
    ///
    /// The returned key zeroizes on drop; callers keep it only for the
    /// duration of one signing operation.
    pub fn load_private_key(&self, key_id: &str) -> StoreResult<PrivateKey> {
        let conn = self.db.lock()?;
        load_private_key_in(&conn, &self.master_key, key_id)
    }

    /// Returns an active key.
    pub fn get(&self, key_id: &str) -> StoreResult<SigningKeyRecord> {
        let conn = self.db.lock()?;
        fetch_key(&conn, key_id, false)?.ok_or_else(|| StoreError::NotFound(key_id.to_string()))
    }

    /// Returns the public key for `key_id`, including retired keys, so old
    /// licenses remain verifiable.
    pub fn public_key(&self, key_id: &str) -> StoreResult<PublicKey> {
        let conn = self.db.lock()?;
        fetch_key(&conn, key_id, true)?
            .map(|k| k.public_key)
            .ok_or_else(|| StoreError::NotFound(key_id.to_string()))
    }

    /// Lists active keys, newest first.
    pub fn list(&self) -> StoreResult<Vec<SigningKeyRecord>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {KEY_COLUMNS} FROM signing_keys WHERE deleted_at IS NULL ORDER BY created_at DESC, key_id"
        ))?;
        let rows = stmt.query_map([], row_to_key)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Replaces the notes on an active key.
    pub fn update_notes(&self, key_id: &str, notes: Option<&str>) -> StoreResult<SigningKeyRecord> {
        let conn = self.db.lock()?;
        let changed = conn.execute(
            "UPDATE signing_keys SET notes = ?2, updated_at = ?3 WHERE key_id = ?1 AND deleted_at IS NULL",
            params![key_id, notes, format_ts(&Utc::now())],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(key_id.to_string()));
        }
        fetch_key(&conn, key_id, false)?.ok_or_else(|| StoreError::NotFound(key_id.to_string()))
    }

    /// Soft-deletes a key that no active license references.
    ///
    /// The reference check and the delete share one `IMMEDIATE` transaction.
    pub fn retire(&self, key_id: &str) -> StoreResult<()> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if fetch_key(&tx, key_id, false)?.is_none() {
            return Err(StoreError::NotFound(key_id.to_string()));
        }

        let in_use: i64 = tx.query_row(
            "SELECT COUNT(*) FROM licenses WHERE key_id = ?1 AND deleted_at IS NULL",
            params![key_id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            warn!(key_id, active_licenses = in_use, "refusing to retire key in use");
            return Err(StoreError::KeyInUse(key_id.to_string()));
        }

        let now = format_ts(&Utc::now());
        tx.execute(
            "UPDATE signing_keys SET deleted_at = ?2, updated_at = ?2 WHERE key_id = ?1",
            params![key_id, now],
        )?;
        tx.commit()?;
        info!(key_id, "retired signing key");
        Ok(())
    }

    /// Imports externally generated keys.
    ///
    /// New ids are inserted. An existing id (retired or not) is only updated
    /// when the entry carries the same public key: it is restored if retired,
    /// gains the supplied private half, and takes the supplied notes. An entry
    /// that would rebind an id to a different public key, or that fails
    /// validation, is skipped and reported.
    pub fn import(&self, keys: &[KeyImport]) -> StoreResult<ImportSummary> {
        let mut summary = ImportSummary {
            total: keys.len(),
            ..ImportSummary::default()
        };

        for (index, entry) in keys.iter().enumerate() {
            match self.import_one(entry) {
                Ok(true) => summary.updated += 1,
                Ok(false) => summary.imported += 1,
                Err(StoreError::Database(e)) => return Err(StoreError::Database(e)),
                Err(e) => {
                    warn!(key_id = %entry.key_id, index, "skipping key import: {e}");
                    summary.skipped += 1;
                    summary.errors.push(ImportOutcome {
                        index,
                        key_id: entry.key_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            imported = summary.imported,
            updated = summary.updated,
            skipped = summary.skipped,
            "key import finished"
        );
        Ok(summary)
    }

    /// Returns true if an existing row was updated.
    fn import_one(&self, entry: &KeyImport) -> StoreResult<bool> {
        validate_key_id(&entry.key_id)?;
        let public_key = PublicKey::from_base64(&entry.public_key_b64)?;

        let sealed = match entry.private_key_b64.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(encoded) => {
                let raw = Zeroizing::new(
                    STANDARD
                        .decode(encoded.trim())
                        .map_err(|e| StoreError::Validation(format!("invalid private key base64: {e}")))?,
                );
                let private_key = PrivateKey::from_import(&raw, &public_key)?;
                Some(self.seal_private_key(&entry.key_id, &private_key)?)
            }
            None => None,
        };

        let now = format_ts(&Utc::now());
        let mut conn = self.db.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let previous_public: Option<String> = tx
            .query_row(
                "SELECT public_key_b64 FROM signing_keys WHERE key_id = ?1",
                params![entry.key_id],
                |row| row.get(0),
            )
            .optional()?;
        let existed = previous_public.is_some();

        if let Some(previous_public) = previous_public {
            // Issued licenses name the key by id, so an id never changes its public key.
            if previous_public != public_key.to_base64() {
                return Err(StoreError::DuplicateKeyId(format!(
                    "{} (already bound to a different public key)",
                    entry.key_id
                )));
            }
            tx.execute(
                "UPDATE signing_keys SET deleted_at = NULL, updated_at = ?2 WHERE key_id = ?1",
                params![entry.key_id, now],
            )?;
            if let Some(sealed) = &sealed {
                tx.execute(
                    "UPDATE signing_keys SET encrypted_private_key = ?2 WHERE key_id = ?1",
                    params![entry.key_id, sealed.to_base64()],
                )?;
            }
            if let Some(notes) = &entry.notes {
                tx.execute(
                    "UPDATE signing_keys SET notes = ?2 WHERE key_id = ?1",
                    params![entry.key_id, notes],
                )?;
            }
        } else {
            tx.execute(
                "INSERT INTO signing_keys (key_id, public_key_b64, encrypted_private_key, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    entry.key_id,
                    public_key.to_base64(),
                    sealed.as_ref().map(SealedData::to_base64),
                    entry.notes,
                    now
                ],
            )?;
        }
        tx.commit()?;
        Ok(existed)
    }

    fn seal_private_key(&self, key_id: &str, private_key: &PrivateKey) -> StoreResult<SealedData> {
        seal(&self.master_key, &private_key.seed()[..], key_id.as_bytes()).map_err(|e| {
            error!(key_id, error_class = "encryption", "sealing private key failed");
            StoreError::Encryption(e.to_string())
        })
    }
}

const KEY_COLUMNS: &str =
    "key_id, public_key_b64, encrypted_private_key IS NOT NULL, notes, created_at, updated_at, deleted_at";

fn validate_key_id(key_id: &str) -> StoreResult<()> {
    if key_id.trim().is_empty() {
        return Err(StoreError::Validation("key_id is required".to_string()));
    }
    if key_id.len() > MAX_KEY_ID_LENGTH {
        return Err(StoreError::Validation(format!(
            "key_id must be at most {MAX_KEY_ID_LENGTH} bytes"
        )));
    }
    Ok(())
}

pub(crate) fn fetch_key(
    conn: &Connection,
    key_id: &str,
    include_retired: bool,
) -> StoreResult<Option<SigningKeyRecord>> {
    let sql = if include_retired {
        format!("SELECT {KEY_COLUMNS} FROM signing_keys WHERE key_id = ?1")
    } else {
        format!("SELECT {KEY_COLUMNS} FROM signing_keys WHERE key_id = ?1 AND deleted_at IS NULL")
    };
    Ok(conn.query_row(&sql, params![key_id], row_to_key).optional()?)
}

/// Unseals the private key of an active key inside an open connection or
/// transaction.
pub(crate) fn load_private_key_in(
    conn: &Connection,
    master_key: &MasterKey,
    key_id: &str,
) -> StoreResult<PrivateKey> {
    let sealed: Option<Option<String>> = conn
        .query_row(
            "SELECT encrypted_private_key FROM signing_keys WHERE key_id = ?1 AND deleted_at IS NULL",
            params![key_id],
            |row| row.get(0),
        )
        .optional()?;

    let sealed = match sealed {
        None => return Err(StoreError::NotFound(key_id.to_string())),
        Some(None) => {
            warn!(key_id, "signing key has no private half");
            return Err(StoreError::KeyUnavailable(key_id.to_string()));
        }
        Some(Some(encoded)) => encoded,
    };

    let unavailable = |class: &str| {
        error!(key_id, error_class = class, "private key could not be unsealed");
        StoreError::KeyUnavailable(key_id.to_string())
    };

    let sealed = SealedData::from_base64(&sealed).map_err(|_| unavailable("encoding"))?;
    let seed = open(master_key, &sealed, key_id.as_bytes()).map_err(|_| unavailable("decryption"))?;
    PrivateKey::from_seed(&seed).map_err(|_| unavailable("seed_length"))
}

fn row_to_key(row: &rusqlite::Row<'_>) -> rusqlite::Result<SigningKeyRecord> {
    let public_key_b64: String = row.get(1)?;
    let public_key = PublicKey::from_base64(&public_key_b64).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    let deleted_at: Option<String> = row.get(6)?;

    Ok(SigningKeyRecord {
        key_id: row.get(0)?,
        public_key,
        has_private_key: row.get(2)?,
        notes: row.get(3)?,
        created_at: parse_ts(4, &created_at)?,
        updated_at: parse_ts(5, &updated_at)?,
        deleted_at: deleted_at.as_deref().map(|d| parse_ts(6, d)).transpose()?,
    })
}
