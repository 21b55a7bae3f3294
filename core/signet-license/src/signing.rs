//! Ed25519 signing and verification over canonical payload bytes.
//!
//! Ed25519 signatures are deterministic: signing the same bytes with the same
//! key always yields the same 64 bytes.

use crate::error::{LicenseError, LicenseResult};
use crate::keys::{PrivateKey, PublicKey};
use ed25519_dalek::{Signature, Signer, Verifier};

/// Length of an Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// Signs canonical payload bytes.
#[must_use]
pub fn sign(payload: &[u8], key: &PrivateKey) -> [u8; SIGNATURE_LENGTH] {
    key.signing_key().sign(payload).to_bytes()
}

/// Verifies a signature over `payload` with raw public key bytes.
///
/// Returns `Ok(false)` for any signature that does not verify.
///
/// # Errors
///
/// Returns [`LicenseError::MalformedInput`] only when the public key or the
/// signature has the wrong length, or the public key is not a curve point.
pub fn verify(payload: &[u8], signature: &[u8], public_key: &[u8]) -> LicenseResult<bool> {
    let public_key = PublicKey::from_slice(public_key)?;
    let signature = Signature::from_slice(signature).map_err(|_| {
        LicenseError::MalformedInput(format!(
            "signature must be {SIGNATURE_LENGTH} bytes, got {}",
            signature.len()
        ))
    })?;

    Ok(public_key.verifying_key().verify(payload, &signature).is_ok())
}
