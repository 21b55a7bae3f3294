//! Ed25519 key material.
//!
//! [`PrivateKey`] is only produced by [`generate_key_pair`] or by loading a
//! sealed seed back out of the key store. It zeroizes on drop and its `Debug`
//! output is redacted, so plaintext key bytes live only as long as the
//! signing operation that needs them.

use crate::error::{LicenseError, LicenseResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::RngCore;
use zeroize::Zeroizing;

/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of an Ed25519 seed (the persisted private key form).
pub const SEED_LENGTH: usize = 32;

/// Length of a libsodium-style secret key (`seed || public key`).
pub const SECRET_KEY_LENGTH: usize = 64;

/// Raw Ed25519 public key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Wraps raw bytes, checking that they form a valid curve point.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::MalformedInput`] for a wrong length or an
    /// invalid point.
    pub fn from_slice(bytes: &[u8]) -> LicenseResult<Self> {
        let array: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            LicenseError::MalformedInput(format!(
                "public key must be {PUBLIC_KEY_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        let key = VerifyingKey::from_bytes(&array).map_err(|_| {
            LicenseError::MalformedInput("public key is not a valid Ed25519 point".to_string())
        })?;
        Ok(Self(key))
    }

    /// Decodes a standard base64 public key.
    pub fn from_base64(encoded: &str) -> LicenseResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| LicenseError::MalformedInput(format!("invalid public key base64: {e}")))?;
        Self::from_slice(&bytes)
    }

    /// Returns the key as standard base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0.as_bytes())
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        self.0.as_bytes()
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }
}

/// An Ed25519 signing key. Zeroized on drop.
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Restores a private key from its 32-byte seed.
    pub fn from_seed(seed: &[u8]) -> LicenseResult<Self> {
        let array: Zeroizing<[u8; SEED_LENGTH]> = Zeroizing::new(seed.try_into().map_err(|_| {
            LicenseError::MalformedInput(format!(
                "private key seed must be {SEED_LENGTH} bytes, got {}",
                seed.len()
            ))
        })?);
        Ok(Self {
            inner: SigningKey::from_bytes(&array),
        })
    }

    /// Restores a private key from imported bytes: either a 32-byte seed or a
    /// 64-byte `seed || public` secret key. For the 64-byte form the embedded
    /// public half must match `expected`.
    pub fn from_import(bytes: &[u8], expected: &PublicKey) -> LicenseResult<Self> {
        let key = match bytes.len() {
            SEED_LENGTH => Self::from_seed(bytes)?,
            SECRET_KEY_LENGTH => {
                let key = Self::from_seed(&bytes[..SEED_LENGTH])?;
                if key.public_key().as_bytes()[..] != bytes[SEED_LENGTH..] {
                    return Err(LicenseError::MalformedInput(
                        "secret key does not embed its own public key".to_string(),
                    ));
                }
                key
            }
            n => {
                return Err(LicenseError::MalformedInput(format!(
                    "private key must be {SEED_LENGTH} bytes (seed) or {SECRET_KEY_LENGTH} bytes (secret key), got {n}"
                )));
            }
        };
        if key.public_key() != *expected {
            return Err(LicenseError::MalformedInput(
                "private key does not match the supplied public key".to_string(),
            ));
        }
        Ok(key)
    }

    /// Returns the matching public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.inner.verifying_key())
    }

    /// Returns a copy of the seed for sealing. Zeroized when dropped.
    #[must_use]
    pub fn seed(&self) -> Zeroizing<[u8; SEED_LENGTH]> {
        Zeroizing::new(self.inner.to_bytes())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("seed", &"[REDACTED]")
            .field("public_key", &self.public_key().to_base64())
            .finish()
    }
}

/// Generates a fresh Ed25519 key pair from the OS RNG.
///
/// # Errors
///
/// Returns [`LicenseError::KeyGeneration`] if the RNG is unavailable.
pub fn generate_key_pair() -> LicenseResult<(PublicKey, PrivateKey)> {
    let mut seed = Zeroizing::new([0u8; SEED_LENGTH]);
    rand::rngs::OsRng
        .try_fill_bytes(&mut seed[..])
        .map_err(|e| LicenseError::KeyGeneration(e.to_string()))?;
    let private = PrivateKey {
        inner: SigningKey::from_bytes(&seed),
    };
    Ok((private.public_key(), private))
}
