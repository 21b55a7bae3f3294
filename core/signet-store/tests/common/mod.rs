//! Shared test helpers for store tests.

#![allow(dead_code)]

use signet_crypto::MasterKey;
use signet_license::LicenseRequest;
use signet_store::{Database, Issuer, KeyStore, LicenseStore};
use std::sync::Arc;

pub fn master_key() -> Arc<MasterKey> {
    Arc::new(MasterKey::from_bytes([7u8; 32]))
}

/// In-memory database with all three handles sharing it.
pub struct Fixture {
    pub db: Database,
    pub keys: KeyStore,
    pub licenses: LicenseStore,
    pub issuer: Issuer,
}

pub fn fixture() -> Fixture {
    fixture_with(Database::open_in_memory().unwrap(), master_key())
}

pub fn fixture_with(db: Database, master_key: Arc<MasterKey>) -> Fixture {
    let keys = KeyStore::new(db.clone(), master_key);
    Fixture {
        licenses: LicenseStore::new(db.clone()),
        issuer: Issuer::new(keys.clone()),
        keys,
        db,
    }
}

pub fn acme_request(key_id: &str) -> LicenseRequest {
    LicenseRequest {
        key_id: key_id.to_string(),
        customer: "Acme School".to_string(),
        edition: "Pro".to_string(),
        validity_days: 365,
        seats: 50,
        notes: None,
        fingerprint_id: "a1b2c3d4e5f60718".to_string(),
    }
}
