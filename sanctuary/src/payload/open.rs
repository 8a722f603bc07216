use sanctuary_crypto::{decrypt_value, CipherError, KeyError, SymmetricKey};
use tracing::{debug, info};

use super::{GateState, OuterPayload, PasscodeGate, StructureError, UnlockError};
use crate::link::{LinkError, ShareLink};
use crate::model::SanctuaryConfig;

/// Why a link failed to open. Only reachable through
/// [`OpenError::MalformedLink`]'s source, for logs.
#[derive(Debug, thiserror::Error)]
pub enum MalformedCause {
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Decrypt(#[from] CipherError),
    #[error(transparent)]
    Structure(#[from] StructureError),
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    /// Missing parts, bad encoding, wrong key and corrupted ciphertext all
    /// look the same to the person holding the link.
    #[error("this link is incomplete or damaged")]
    MalformedLink(#[source] MalformedCause),
    #[error("opening task failed: {0}")]
    Task(String),
}

fn malformed(cause: impl Into<MalformedCause>) -> OpenError {
    let cause = cause.into();
    debug!(error = %cause, "share link rejected");
    OpenError::MalformedLink(cause)
}

/// A decrypted link: the visible configuration plus its passcode gate.
#[derive(Debug, Clone)]
pub struct OpenedSanctuary {
    config: SanctuaryConfig,
    gate: PasscodeGate,
}

/// Parse, decrypt and structurally check a share link.
///
/// A locked link opens in [`GateState::Locked`] with notes and video
/// hidden; everything else opens [`GateState::Unlocked`].
///
/// # Errors
/// Returns `OpenError::MalformedLink` for any missing, malformed or
/// undecryptable component.
pub async fn open(url: &str) -> Result<OpenedSanctuary, OpenError> {
    let link = ShareLink::parse(url).map_err(malformed)?;
    tokio::task::spawn_blocking(move || open_blocking(&link))
        .await
        .map_err(|e| OpenError::Task(e.to_string()))?
}

fn open_blocking(link: &ShareLink) -> Result<OpenedSanctuary, OpenError> {
    let key = SymmetricKey::import(link.key()).map_err(malformed)?;
    let payload: OuterPayload = decrypt_value(&link.envelope, &key).map_err(malformed)?;
    let (config, lock) = payload.into_parts().map_err(malformed)?;

    info!(locked = lock.is_some(), plan = %config.plan, "opened share link");
    Ok(OpenedSanctuary {
        config,
        gate: PasscodeGate::new(lock),
    })
}

impl OpenedSanctuary {
    /// The configuration as currently visible. While locked, `notes` is
    /// empty and `video_url` is `None`.
    #[must_use]
    pub const fn config(&self) -> &SanctuaryConfig {
        &self.config
    }

    #[must_use]
    pub fn into_config(self) -> SanctuaryConfig {
        self.config
    }

    #[must_use]
    pub const fn gate(&self) -> &PasscodeGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut PasscodeGate {
        &mut self.gate
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.gate.state() == GateState::Unlocked
    }

    /// Verify the digits entered on the gate.
    ///
    /// On success the recovered notes, video and passcode replace the
    /// visible fields in one step. On failure the configuration is left
    /// exactly as it was and the gate is back to `Locked` with its input
    /// cleared.
    ///
    /// # Errors
    /// Returns `UnlockError::IncorrectCode` for a wrong passcode, or another
    /// `UnlockError` if there is nothing to verify.
    pub async fn submit(&mut self) -> Result<(), UnlockError> {
        let content = self.gate.verify().await?;
        content.merge_into(&mut self.config);
        Ok(())
    }

    /// Enter a whole passcode and submit it.
    ///
    /// # Errors
    /// Returns `UnlockError::InvalidInput` if `passcode` is not four ASCII
    /// digits, otherwise as [`OpenedSanctuary::submit`].
    pub async fn unlock_with(&mut self, passcode: &str) -> Result<(), UnlockError> {
        if self.is_unlocked() {
            return Err(UnlockError::NotLocked);
        }
        self.gate.clear();
        if !passcode.chars().all(|digit| self.gate.push_digit(digit)) {
            self.gate.clear();
            return Err(UnlockError::InvalidInput);
        }
        let result = self.submit().await;
        if result == Err(UnlockError::InvalidInput) {
            self.gate.clear();
        }
        result
    }
}
