//! Envelope encryption for Signet signing keys.
//!
//! Private signing keys are never persisted in the clear. Each one is sealed
//! with a process-wide [`MasterKey`] using ChaCha20-Poly1305 before it reaches
//! the database, and the master key itself lives only in process memory
//! (supplied through configuration, or derived from a passphrase with
//! Argon2id).
//!
//! The key id of the row being sealed is bound in as associated data, so a
//! ciphertext copied onto another row fails to open.

mod envelope;
mod error;
mod key;

pub use envelope::{NONCE_SIZE, SealedData, TAG_SIZE, open, seal};
pub use error::{CryptoError, CryptoResult};
pub use key::{KEY_SIZE, KdfParams, MasterKey, SALT_SIZE, Salt, derive_master_key, generate_master_key};
