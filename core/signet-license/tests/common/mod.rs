//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use signet_license::{LicensePayload, LicenseRequest, PortableLicense, PrivateKey, PublicKey, sign};

/// Returns a deterministic Ed25519 key pair from a fixed seed.
pub fn test_keypair() -> (PrivateKey, PublicKey) {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    let private = PrivateKey::from_seed(&seed).unwrap();
    let public = private.public_key();
    (private, public)
}

/// The `prod-2025` / Acme School request used across tests.
pub fn acme_request() -> LicenseRequest {
    LicenseRequest {
        key_id: "prod-2025".to_string(),
        customer: "Acme School".to_string(),
        edition: "Pro".to_string(),
        validity_days: 365,
        seats: 50,
        notes: None,
        fingerprint_id: "a1b2c3d4e5f60718".to_string(),
    }
}

pub fn issued_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
}

/// Builds the Acme payload issued at `at`.
pub fn acme_payload_at(at: DateTime<Utc>) -> LicensePayload {
    acme_request().validate().unwrap().into_payload(at).unwrap()
}

/// Signs a payload and wraps it as a portable license.
pub fn sign_payload(private: &PrivateKey, payload: &LicensePayload) -> PortableLicense {
    let bytes = payload.canonical_bytes().unwrap();
    let signature = sign(&bytes, private);
    PortableLicense::new(bytes, signature.to_vec())
}
