//! The two-line portable license file read by the desktop client.
//!
//! ```text
//! base64(canonical payload)
//! base64(signature)
//! ```
//!
//! Standard alphabet with padding, `\n` between the lines and nothing after
//! the second one. Decoding tolerates CRLF endings and a single trailing
//! newline, since files pass through editors and mail clients.

use crate::error::{LicenseError, LicenseResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::Path;

/// Conventional file extension for portable licenses.
pub const FILE_EXTENSION: &str = "dat";

/// Payload and signature bytes as carried in a portable license file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableLicense {
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

impl PortableLicense {
    #[must_use]
    pub fn new(payload: Vec<u8>, signature: Vec<u8>) -> Self {
        Self { payload, signature }
    }

    /// Returns the payload as base64 (line 1).
    #[must_use]
    pub fn payload_b64(&self) -> String {
        STANDARD.encode(&self.payload)
    }

    /// Returns the signature as base64 (line 2).
    #[must_use]
    pub fn signature_b64(&self) -> String {
        STANDARD.encode(&self.signature)
    }

    /// Renders the file contents.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}\n{}", self.payload_b64(), self.signature_b64())
    }

    /// Parses file contents.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::MalformedFile`] if there are not exactly two
    /// non-empty lines or either line is not valid base64.
    pub fn decode(contents: &str) -> LicenseResult<Self> {
        let body = contents
            .strip_suffix("\r\n")
            .or_else(|| contents.strip_suffix('\n'))
            .unwrap_or(contents);

        let lines: Vec<&str> = body.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
        if lines.len() != 2 {
            return Err(LicenseError::MalformedFile(format!(
                "expected 2 lines, found {}",
                lines.len()
            )));
        }
        if lines.iter().any(|l| l.is_empty()) {
            return Err(LicenseError::MalformedFile("empty line".to_string()));
        }

        let payload = STANDARD
            .decode(lines[0])
            .map_err(|e| LicenseError::MalformedFile(format!("line 1 is not valid base64: {e}")))?;
        let signature = STANDARD
            .decode(lines[1])
            .map_err(|e| LicenseError::MalformedFile(format!("line 2 is not valid base64: {e}")))?;

        Ok(Self { payload, signature })
    }

    /// Builds a portable license from its two base64 parts, as submitted to
    /// the verify endpoint.
    pub fn from_base64_parts(payload_b64: &str, signature_b64: &str) -> LicenseResult<Self> {
        Self::decode(&format!("{}\n{}", payload_b64.trim(), signature_b64.trim()))
    }

    /// Writes the file to `path`.
    pub fn write_to(&self, path: &Path) -> LicenseResult<()> {
        std::fs::write(path, self.encode())?;
        Ok(())
    }

    /// Reads and decodes the file at `path`.
    pub fn read_from(path: &Path) -> LicenseResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::decode(&contents)
    }
}
