//! Encrypted envelope: the wire form of one AES-256-GCM encryption.
//!
//! Both fields are transport (base64url) strings so the envelope can sit in
//! a URL query (`d`, `iv`) or inside a JSON payload (`{"ciphertext", "iv"}`).
//!
//! | Field      | Decoded size             |
//! |------------|--------------------------|
//! | iv         | 12 bytes                 |
//! | ciphertext | plaintext + 16-byte tag  |
//!
//! The version marker is implicit: there is only version 1.

use serde::{Deserialize, Serialize};

use crate::{decode_transport, encode_transport, DecodeError};

/// IV length in bytes (96-bit GCM nonce).
pub const IV_LEN: usize = 12;
/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;
/// Upper bound on decoded ciphertext (defence-in-depth; URLs are far smaller).
const MAX_CIPHERTEXT: usize = 1 << 20;

/// Ciphertext and IV of a single encryption, both transport-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub ciphertext: String,
    pub iv: String,
}

/// Errors from decoding an envelope's transport strings.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("envelope field is not valid transport encoding: {0}")]
    Encoding(#[from] DecodeError),
    #[error("IV must be {IV_LEN} bytes, got {0}")]
    InvalidIvLength(usize),
    #[error("ciphertext shorter than the {TAG_LEN}-byte authentication tag")]
    CiphertextTooSmall,
    #[error("ciphertext too large")]
    CiphertextTooLarge,
}

impl EncryptedEnvelope {
    pub(crate) fn from_parts(iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Self {
        Self {
            ciphertext: encode_transport(ciphertext),
            iv: encode_transport(iv),
        }
    }

    /// Decode and validate both fields.
    ///
    /// # Errors
    /// Returns an error if either field is not base64url, the IV is not
    /// 12 bytes, or the ciphertext cannot hold a GCM tag.
    pub fn decode(&self) -> Result<([u8; IV_LEN], Vec<u8>), EnvelopeError> {
        let iv_raw = decode_transport(&self.iv)?;
        let iv: [u8; IV_LEN] = iv_raw
            .as_slice()
            .try_into()
            .map_err(|_| EnvelopeError::InvalidIvLength(iv_raw.len()))?;

        let ciphertext = decode_transport(&self.ciphertext)?;
        if ciphertext.len() < TAG_LEN {
            return Err(EnvelopeError::CiphertextTooSmall);
        }
        if ciphertext.len() > MAX_CIPHERTEXT {
            return Err(EnvelopeError::CiphertextTooLarge);
        }

        Ok((iv, ciphertext))
    }

    /// Combined length of both transport strings.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.ciphertext.len() + self.iv.len()
    }
}
