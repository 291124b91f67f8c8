//! Uploaded document

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::sync::Arc;

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Immutable document payload. Cloning is cheap; the base64 body is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    data: Arc<str>,
    byte_len: usize,
    fingerprint: String,
}

impl Document {
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut fingerprint = String::with_capacity(digest.len() * 2);
        for b in digest {
            fingerprint.push_str(&format!("{:02x}", b));
        }

        Self {
            name: name.into(),
            data: Arc::from(STANDARD.encode(bytes)),
            byte_len: bytes.len(),
            fingerprint,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &'static str {
        PDF_MIME_TYPE
    }

    /// Base64 payload as sent upstream
    pub fn base64(&self) -> &str {
        &self.data
    }

    pub(crate) fn shared_data(&self) -> Arc<str> {
        Arc::clone(&self.data)
    }

    /// Size of the original file in bytes
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Hex SHA-256 of the original bytes
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn short_fingerprint(&self) -> &str {
        &self.fingerprint[..12]
    }
}
