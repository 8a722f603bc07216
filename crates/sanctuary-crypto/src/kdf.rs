//! Passcode key derivation.
//!
//! Argon2id (v0x13) stretches a 4-digit passcode and a per-document 16-byte
//! salt into a [`SymmetricKey`]. Ten thousand codes is not a cryptographic
//! boundary; the work factor only makes each guess cost real time.
//!
//! Same passcode + salt + params always yields the same key.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::cipher::{SymmetricKey, KEY_LEN};
use crate::{decode_transport, encode_transport, DecodeError};

/// Passcode meaning "no passcode protection requested".
pub const SENTINEL_PASSCODE: &str = "1402";

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Exact-match check for the sentinel passcode.
#[must_use]
pub fn is_sentinel_passcode(passcode: &str) -> bool {
    passcode == SENTINEL_PASSCODE
}

/// Argon2id work factors. Serialized alongside the salt so a link opens
/// identically wherever it is opened, even after defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Lanes.
    pub p_cost: u32,
}

impl KdfParams {
    /// 19 MiB, 2 passes, 1 lane (OWASP Argon2id baseline; well under a second
    /// in a browser).
    pub const DEFAULT: Self = Self {
        m_cost: 19_456,
        t_cost: 2,
        p_cost: 1,
    };

    /// Weakest parameters accepted when sealing or opening.
    pub const MINIMUM: Self = Self {
        m_cost: 8_192,
        t_cost: 1,
        p_cost: 1,
    };

    /// Strongest parameters accepted. Links carry their own parameters, so
    /// this bounds the work a crafted link can demand.
    pub const MAXIMUM: Self = Self {
        m_cost: 262_144,
        t_cost: 10,
        p_cost: 4,
    };

    /// Reject parameters outside [`KdfParams::MINIMUM`]..=[`KdfParams::MAXIMUM`].
    ///
    /// # Errors
    /// Returns `KdfError::WeakParams` if any cost is below the minimum and
    /// `KdfError::ExcessiveParams` if any cost is above the maximum.
    pub fn validate(&self) -> Result<(), KdfError> {
        if self.m_cost < Self::MINIMUM.m_cost
            || self.t_cost < Self::MINIMUM.t_cost
            || self.p_cost < Self::MINIMUM.p_cost
        {
            return Err(KdfError::WeakParams);
        }
        if self.m_cost > Self::MAXIMUM.m_cost
            || self.t_cost > Self::MAXIMUM.t_cost
            || self.p_cost > Self::MAXIMUM.p_cost
        {
            return Err(KdfError::ExcessiveParams);
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-document random salt. Not secret; travels in the outer payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasscodeSalt([u8; SALT_LEN]);

/// Errors from passcode key derivation.
#[derive(Debug, thiserror::Error)]
pub enum KdfError {
    #[error("KDF parameters too weak (m_cost >= 8192, t_cost >= 1, p_cost >= 1)")]
    WeakParams,
    #[error("KDF parameters too costly (m_cost <= 262144, t_cost <= 10, p_cost <= 4)")]
    ExcessiveParams,
    #[error("passcode is empty")]
    EmptyPasscode,
    #[error("salt is not valid transport encoding: {0}")]
    SaltEncoding(#[from] DecodeError),
    #[error("salt must be {SALT_LEN} bytes, got {0}")]
    SaltLength(usize),
    #[error("key derivation failed: {0}")]
    Derivation(String),
}

impl PasscodeSalt {
    /// Generate a fresh salt from the operating system CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self(salt)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    #[must_use]
    pub fn to_transport(&self) -> String {
        encode_transport(&self.0)
    }

    /// Parse a salt from its transport form.
    ///
    /// # Errors
    /// Returns an error if the string is not base64url or is not 16 bytes.
    pub fn from_transport(encoded: &str) -> Result<Self, KdfError> {
        let raw = decode_transport(encoded)?;
        let bytes: [u8; SALT_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| KdfError::SaltLength(raw.len()))?;
        Ok(Self(bytes))
    }
}

/// Derive the passcode-tier key.
///
/// # Errors
/// Returns an error for an empty passcode, weak parameters, or an Argon2
/// failure.
pub fn derive_key(
    passcode: &str,
    salt: &PasscodeSalt,
    params: KdfParams,
) -> Result<SymmetricKey, KdfError> {
    if passcode.is_empty() {
        return Err(KdfError::EmptyPasscode);
    }
    params.validate()?;

    let argon_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(KEY_LEN))
        .map_err(|e| KdfError::Derivation(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passcode.as_bytes(), salt.as_bytes(), output.as_mut())
        .map_err(|e| KdfError::Derivation(e.to_string()))?;

    Ok(SymmetricKey::from_bytes(*output))
}
