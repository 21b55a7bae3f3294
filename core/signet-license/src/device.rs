//! Machine fingerprints for license binding.
//!
//! The desktop client computes this id and sends it with its license request;
//! it is the value that ends up in `fingerprint.fingerprint_id`.

use crate::error::{LicenseError, LicenseResult};
use crate::validation::validate_fingerprint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;

/// A 16-hex-character id that identifies one machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceFingerprint {
    id: String,
}

impl DeviceFingerprint {
    /// Generates the fingerprint for the current machine.
    ///
    /// Combines stable hardware and OS identifiers, hashes them with SHA-256
    /// and keeps the first 8 bytes as lowercase hex.
    #[must_use]
    pub fn generate() -> Self {
        let components = collect_hardware_ids();
        let combined = components.join("|");

        let hash = Sha256::digest(combined.as_bytes());

        Self {
            id: hex::encode(&hash[..FINGERPRINT_BYTES]),
        }
    }

    /// Wraps an id received from a client.
    pub fn parse(id: &str) -> LicenseResult<Self> {
        if !validate_fingerprint(id) {
            return Err(LicenseError::Validation(
                "fingerprint_id must be 16 hexadecimal characters".to_string(),
            ));
        }
        Ok(Self {
            id: id.to_ascii_lowercase(),
        })
    }

    /// Returns the fingerprint id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Validates that this fingerprint matches the current machine.
    #[must_use]
    pub fn matches_current(&self) -> bool {
        self.id == Self::generate().id
    }
}

const FINGERPRINT_BYTES: usize = 8;

fn collect_hardware_ids() -> Vec<String> {
    let mut ids = vec![env::consts::OS.to_string(), env::consts::ARCH.to_string(), get_hostname()];

    if let Some(machine_id) = get_machine_id() {
        ids.push(machine_id);
    }

    ids
}

fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn get_machine_id() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}
