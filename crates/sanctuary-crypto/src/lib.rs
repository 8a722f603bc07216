//! Client-side cryptography for Sanctuary share links.
//!
//! This crate is used natively by the `sanctuary` crate and compiled to WASM
//! for the browser, so a link sealed on one side always opens on the other.
//!
//! - [`encode_transport`] / [`decode_transport`]: base64url text form for all
//!   binary material carried in a URL
//! - [`SymmetricKey`], [`encrypt_value`], [`decrypt_value`]: AES-256-GCM over
//!   canonical JSON
//! - [`derive_key`]: Argon2id passcode key derivation

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use wasm_bindgen::prelude::*;

mod cipher;
pub use cipher::{decrypt_value, encrypt_value, CipherError, KeyError, SymmetricKey, KEY_LEN};

mod envelope;
pub use envelope::{EncryptedEnvelope, EnvelopeError, IV_LEN, TAG_LEN};

mod kdf;
pub use kdf::{
    derive_key, is_sentinel_passcode, KdfError, KdfParams, PasscodeSalt, SALT_LEN,
    SENTINEL_PASSCODE,
};

/// base64url alphabet, unpadded on encode, padding optional on decode.
const TRANSPORT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Error type for transport (base64url) decoding failures
#[derive(Debug, thiserror::Error)]
#[error("invalid base64url encoding: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

/// Encode bytes for transport in a URL query parameter or fragment.
///
/// Produces base64url (RFC 4648 §5) without padding, so the output never
/// needs percent-encoding.
#[wasm_bindgen(js_name = "encodeTransport")]
#[must_use]
pub fn encode_transport(bytes: &[u8]) -> String {
    TRANSPORT.encode(bytes)
}

/// Decode a transport string back to bytes.
///
/// Accepts input with or without canonical padding.
///
/// # Errors
/// Returns `DecodeError` on characters outside the base64url alphabet,
/// malformed padding, or a truncated final quantum.
pub fn decode_transport(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    TRANSPORT.decode(encoded).map_err(DecodeError::from)
}

/// Decode a transport string (WASM binding).
///
/// For native Rust code, use [`decode_transport`] instead.
///
/// # Errors
/// Returns `JsError` if the input is not valid base64url
#[wasm_bindgen(js_name = "decodeTransport")]
pub fn decode_transport_js(encoded: &str) -> Result<Vec<u8>, JsError> {
    decode_transport(encoded).map_err(|e| JsError::new(&e.to_string()))
}

/// Generate a fresh master key and return it in transport form (WASM binding).
#[wasm_bindgen(js_name = "generateMasterKey")]
#[must_use]
pub fn generate_master_key_js() -> String {
    SymmetricKey::generate().export()
}

/// Encrypt a JSON document under a transport-encoded key (WASM binding).
///
/// Returns the envelope as a JSON string `{"ciphertext": .., "iv": ..}`.
///
/// # Errors
/// Returns `JsError` if the key or JSON is invalid, or encryption fails.
#[wasm_bindgen(js_name = "encryptJson")]
pub fn encrypt_json_js(json: &str, key: &str) -> Result<String, JsError> {
    let key = SymmetricKey::import(key).map_err(|e| JsError::new(&e.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| JsError::new(&e.to_string()))?;
    let envelope = encrypt_value(&value, &key).map_err(|e| JsError::new(&e.to_string()))?;
    serde_json::to_string(&envelope).map_err(|e| JsError::new(&e.to_string()))
}

/// Decrypt an envelope JSON string under a transport-encoded key (WASM binding).
///
/// # Errors
/// Returns `JsError` on a bad key, a malformed envelope, or an authentication failure.
#[wasm_bindgen(js_name = "decryptJson")]
pub fn decrypt_json_js(envelope: &str, key: &str) -> Result<String, JsError> {
    let key = SymmetricKey::import(key).map_err(|e| JsError::new(&e.to_string()))?;
    let envelope: EncryptedEnvelope =
        serde_json::from_str(envelope).map_err(|e| JsError::new(&e.to_string()))?;
    let value: serde_json::Value =
        decrypt_value(&envelope, &key).map_err(|e| JsError::new(&e.to_string()))?;
    Ok(value.to_string())
}

/// Derive the passcode key (WASM binding).
///
/// Pass the `passcodeKdf` values recorded in the link, so keys match
/// whatever work factors the link was sealed with.
///
/// # Errors
/// Returns `JsError` if the salt is malformed, the parameters are out of
/// range, or derivation fails.
#[wasm_bindgen(js_name = "derivePasscodeKey")]
pub fn derive_passcode_key_js(
    passcode: &str,
    salt: &str,
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
) -> Result<String, JsError> {
    let salt = PasscodeSalt::from_transport(salt).map_err(|e| JsError::new(&e.to_string()))?;
    let params = KdfParams {
        m_cost,
        t_cost,
        p_cost,
    };
    let key = derive_key(passcode, &salt, params).map_err(|e| JsError::new(&e.to_string()))?;
    Ok(key.export())
}
