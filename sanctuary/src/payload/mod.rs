//! Two-tier payload assembly.
//!
//! The master tier is the whole configuration encrypted under a fresh key
//! carried in the link fragment. When the passcode is not the sentinel, the
//! notes and the video URL are first encrypted under an Argon2id key derived
//! from the passcode and travel inside the master tier as nested envelopes.
//!
//! ```text
//! outer payload (master key)
//! ├── SanctuaryConfig fields (notes = [], videoUrl absent, passcode = "")
//! ├── encryptedNotes  ─┐
//! ├── encryptedVideo  ─┤ passcode key
//! ├── passcodeSalt
//! └── passcodeKdf
//! ```

mod gate;
mod open;
mod seal;

pub use gate::{GateState, PasscodeGate, UnlockError};
pub use open::{open, MalformedCause, OpenError, OpenedSanctuary};
pub use seal::{seal, SealError, SealOptions, SealedLink};

use sanctuary_crypto::{
    decrypt_value, derive_key, is_sentinel_passcode, EncryptedEnvelope, KdfParams, PasscodeSalt,
};
use serde::{Deserialize, Serialize};

use crate::model::{Note, SanctuaryConfig};

/// Everything encrypted under the master key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OuterPayload {
    #[serde(flatten)]
    pub config: SanctuaryConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_notes: Option<EncryptedEnvelope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_video: Option<EncryptedEnvelope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passcode_salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passcode_kdf: Option<KdfParams>,
}

/// Ways a decrypted outer payload can be structurally inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("passcode lock fields are only partially present")]
    PartialLock,
    #[error("locked payload also carries notes, video or passcode in the clear")]
    LockedFieldsExposed,
    #[error("payload without a passcode lock has a non-sentinel passcode")]
    MissingLock,
    #[error("invalid passcode salt: {0}")]
    Salt(#[source] sanctuary_crypto::KdfError),
    #[error("passcode KDF parameters out of range: {0}")]
    Params(#[source] sanctuary_crypto::KdfError),
}

impl OuterPayload {
    pub(crate) fn new(config: SanctuaryConfig, lock: Option<&PasscodeLock>) -> Self {
        Self {
            config,
            encrypted_notes: lock.map(|l| l.notes.clone()),
            encrypted_video: lock.map(|l| l.video.clone()),
            passcode_salt: lock.map(|l| l.salt.to_transport()),
            passcode_kdf: lock.map(|l| l.params),
        }
    }

    /// Split into the visible configuration and its passcode lock, checking
    /// that the lock fields are all-or-nothing and that a locked payload
    /// exposes none of the protected fields.
    pub(crate) fn into_parts(self) -> Result<(SanctuaryConfig, Option<PasscodeLock>), StructureError> {
        let lock = match (
            self.encrypted_notes,
            self.encrypted_video,
            self.passcode_salt,
            self.passcode_kdf,
        ) {
            (None, None, None, None) => None,
            (Some(notes), Some(video), Some(salt), Some(params)) => {
                params.validate().map_err(StructureError::Params)?;
                Some(PasscodeLock {
                    notes,
                    video,
                    salt: PasscodeSalt::from_transport(&salt).map_err(StructureError::Salt)?,
                    params,
                })
            }
            _ => return Err(StructureError::PartialLock),
        };

        let config = self.config;
        match &lock {
            Some(_) => {
                if !config.notes.is_empty() || config.video().is_some() || !config.passcode.is_empty() {
                    return Err(StructureError::LockedFieldsExposed);
                }
            }
            None => {
                if !is_sentinel_passcode(&config.passcode) {
                    return Err(StructureError::MissingLock);
                }
            }
        }
        Ok((config, lock))
    }
}

/// The passcode tier of an opened link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasscodeLock {
    pub(crate) notes: EncryptedEnvelope,
    pub(crate) video: EncryptedEnvelope,
    pub(crate) salt: PasscodeSalt,
    pub(crate) params: KdfParams,
}

/// Fields recovered from the passcode tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedContent {
    pub notes: Vec<Note>,
    pub video_url: Option<String>,
    pub(crate) passcode: String,
}

impl NestedContent {
    /// Put the recovered fields back into the visible configuration.
    pub(crate) fn merge_into(self, config: &mut SanctuaryConfig) {
        config.notes = self.notes;
        config.video_url = self.video_url.filter(|url| !url.is_empty());
        config.passcode = self.passcode;
    }
}

impl PasscodeLock {
    #[must_use]
    pub const fn params(&self) -> KdfParams {
        self.params
    }

    /// Derive the passcode key and decrypt both nested envelopes. Blocking.
    ///
    /// Both must open; a key that opens only one of them is treated as a
    /// wrong passcode and logged, since it can only come from a corrupted or
    /// hand-assembled payload.
    pub(crate) fn open(&self, passcode: String) -> Result<NestedContent, UnlockError> {
        let key = derive_key(&passcode, &self.salt, self.params).map_err(|e| {
            tracing::debug!(error = %e, "passcode key derivation failed");
            UnlockError::IncorrectCode
        })?;

        let notes = decrypt_value::<Vec<Note>>(&self.notes, &key);
        let video = decrypt_value::<Option<String>>(&self.video, &key);
        match (notes, video) {
            (Ok(notes), Ok(video_url)) => Ok(NestedContent {
                notes,
                video_url,
                passcode,
            }),
            (Err(_), Err(_)) => Err(UnlockError::IncorrectCode),
            (notes, video) => {
                tracing::error!(
                    notes_ok = notes.is_ok(),
                    video_ok = video.is_ok(),
                    "passcode opened only one nested envelope"
                );
                Err(UnlockError::IncorrectCode)
            }
        }
    }
}
