//! Symmetric encryption engine shared by the master-key and passcode tiers.
//!
//! AES-256-GCM with a fresh random 96-bit IV per call. Values are serialized
//! to canonical JSON bytes before encryption, so anything `Serialize` can be
//! sealed and anything `DeserializeOwned` can be opened.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::envelope::{EncryptedEnvelope, EnvelopeError, IV_LEN};
use crate::{decode_transport, encode_transport, DecodeError};

/// Key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key. Zeroized on drop; never printed.
///
/// Construct via [`SymmetricKey::generate`] (master tier),
/// [`crate::derive_key`] (passcode tier) or [`SymmetricKey::import`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

/// Errors from importing key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key is not valid transport encoding: {0}")]
    Encoding(#[from] DecodeError),
    #[error("key must be {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// Errors from encrypting or decrypting a value.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("failed to serialize plaintext: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("encryption failed")]
    Encrypt,
    #[error("malformed envelope: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("decryption failed: wrong key or tampered data")]
    Decrypt,
    #[error("decrypted payload is not the expected shape: {0}")]
    Deserialize(#[source] serde_json::Error),
}

impl SymmetricKey {
    /// Generate a fresh key from the operating system CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub(crate) const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Export the raw key in transport form, suitable for a URL fragment.
    #[must_use]
    pub fn export(&self) -> String {
        encode_transport(&self.0)
    }

    /// Import a key previously produced by [`SymmetricKey::export`].
    ///
    /// # Errors
    /// Returns `KeyError` if the string is not base64url or does not decode
    /// to exactly 32 bytes.
    pub fn import(encoded: &str) -> Result<Self, KeyError> {
        let raw = Zeroizing::new(decode_transport(encoded)?);
        let bytes: [u8; KEY_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidLength(raw.len()))?;
        Ok(Self(bytes))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Serialize `value` to JSON and encrypt it under `key`.
///
/// Every call draws a new random IV, so sealing the same value twice yields
/// different envelopes.
///
/// # Errors
/// Returns `CipherError::Serialize` if the value cannot be serialized and
/// `CipherError::Encrypt` if the AEAD rejects the input.
pub fn encrypt_value<T>(value: &T, key: &SymmetricKey) -> Result<EncryptedEnvelope, CipherError>
where
    T: Serialize + ?Sized,
{
    let plaintext = Zeroizing::new(serde_json::to_vec(value).map_err(CipherError::Serialize)?);

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = key
        .cipher()
        .encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
        .map_err(|_| CipherError::Encrypt)?;

    Ok(EncryptedEnvelope::from_parts(&iv, &ciphertext))
}

/// Decrypt an envelope under `key` and deserialize the JSON plaintext.
///
/// # Errors
/// Returns `CipherError::Envelope` for malformed transport strings or sizes,
/// `CipherError::Decrypt` when the authentication tag does not verify, and
/// `CipherError::Deserialize` when the plaintext is not a `T`.
pub fn decrypt_value<T>(envelope: &EncryptedEnvelope, key: &SymmetricKey) -> Result<T, CipherError>
where
    T: DeserializeOwned,
{
    let (iv, ciphertext) = envelope.decode()?;

    let plaintext = Zeroizing::new(
        key.cipher()
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
            .map_err(|_| CipherError::Decrypt)?,
    );

    serde_json::from_slice(&plaintext).map_err(CipherError::Deserialize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashSet;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        days: Vec<u32>,
    }

    fn sample() -> Sample {
        Sample {
            name: "Ada".into(),
            days: vec![0, 1, 2],
        }
    }

    fn flip_char(s: &str, index: usize) -> String {
        let mut chars: Vec<char> = s.chars().collect();
        chars[index] = if chars[index] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    }

    #[test]
    fn roundtrip_struct() {
        let key = SymmetricKey::generate();
        let envelope = encrypt_value(&sample(), &key).expect("encrypt");
        let opened: Sample = decrypt_value(&envelope, &key).expect("decrypt");
        assert_eq!(opened, sample());
    }

    #[test]
    fn export_import_roundtrip() {
        let key = SymmetricKey::generate();
        let exported = key.export();
        assert_eq!(exported.len(), 43);
        let imported = SymmetricKey::import(&exported).expect("import");
        assert_eq!(imported.export(), exported);
    }

    #[test]
    fn import_rejects_wrong_length() {
        let short = encode_transport(&[7u8; 16]);
        assert!(matches!(
            SymmetricKey::import(&short),
            Err(KeyError::InvalidLength(16))
        ));
    }

    #[test]
    fn import_rejects_bad_alphabet() {
        assert!(matches!(
            SymmetricKey::import("abc+/def"),
            Err(KeyError::Encoding(_))
        ));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = SymmetricKey::from_bytes([0xAB; KEY_LEN]);
        let rendered = format!("{key:?}");
        assert_eq!(rendered, "SymmetricKey(..)");
    }

    #[test]
    fn wrong_key_fails() {
        let envelope = encrypt_value(&sample(), &SymmetricKey::generate()).expect("encrypt");
        let result: Result<Sample, _> = decrypt_value(&envelope, &SymmetricKey::generate());
        assert!(matches!(result, Err(CipherError::Decrypt)));
    }

    #[test]
    fn every_ciphertext_byte_is_authenticated() {
        let key = SymmetricKey::generate();
        let envelope = encrypt_value(&sample(), &key).expect("encrypt");
        let raw = decode_transport(&envelope.ciphertext).expect("decode");

        for index in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[index] ^= 0x01;
            let forged = EncryptedEnvelope {
                ciphertext: encode_transport(&tampered),
                iv: envelope.iv.clone(),
            };
            let result: Result<Sample, _> = decrypt_value(&forged, &key);
            assert!(result.is_err(), "byte {index} flip went undetected");
        }
    }

    #[test]
    fn every_iv_byte_is_authenticated() {
        let key = SymmetricKey::generate();
        let envelope = encrypt_value(&sample(), &key).expect("encrypt");
        let raw = decode_transport(&envelope.iv).expect("decode");

        for index in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[index] ^= 0x80;
            let forged = EncryptedEnvelope {
                ciphertext: envelope.ciphertext.clone(),
                iv: encode_transport(&tampered),
            };
            let result: Result<Sample, _> = decrypt_value(&forged, &key);
            assert!(matches!(result, Err(CipherError::Decrypt)));
        }
    }

    #[test]
    fn tampered_transport_text_is_rejected() {
        let key = SymmetricKey::generate();
        let envelope = encrypt_value(&sample(), &key).expect("encrypt");
        let forged = EncryptedEnvelope {
            ciphertext: flip_char(&envelope.ciphertext, 0),
            iv: envelope.iv.clone(),
        };
        let result: Result<Sample, _> = decrypt_value(&forged, &key);
        assert!(result.is_err());
    }

    #[test]
    fn iv_is_fresh_per_call() {
        let key = SymmetricKey::generate();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let envelope = encrypt_value(&0u8, &key).expect("encrypt");
            assert!(seen.insert(envelope.iv), "IV reused");
        }
    }

    #[test]
    fn wrong_shape_is_a_deserialize_error() {
        let key = SymmetricKey::generate();
        let envelope = encrypt_value(&"just a string", &key).expect("encrypt");
        let result: Result<Sample, _> = decrypt_value(&envelope, &key);
        assert!(matches!(result, Err(CipherError::Deserialize(_))));
    }
}
