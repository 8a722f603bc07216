use sanctuary_crypto::{
    derive_key, encrypt_value, is_sentinel_passcode, CipherError, KdfError, KdfParams,
    PasscodeSalt, SymmetricKey,
};
use tracing::{info, warn};
use url::Url;

use super::{OuterPayload, PasscodeLock};
use crate::config::Settings;
use crate::link::{LinkError, LinkReport, ShareLink, DEFAULT_SOFT_LIMIT};
use crate::model::SanctuaryConfig;
use crate::validation::{validate_config, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("passcode key derivation failed: {0}")]
    Kdf(#[from] KdfError),
    #[error("encryption failed: {0}")]
    Cipher(#[from] CipherError),
    #[error("could not build link: {0}")]
    Link(#[from] LinkError),
    #[error("sealing task failed: {0}")]
    Task(String),
}

/// Where the link points and how hard the passcode tier works.
#[derive(Debug, Clone)]
pub struct SealOptions {
    pub origin: String,
    pub soft_limit: usize,
    pub kdf: KdfParams,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self {
            origin: "https://sanctuary.example".to_string(),
            soft_limit: DEFAULT_SOFT_LIMIT,
            kdf: KdfParams::DEFAULT,
        }
    }
}

impl From<&Settings> for SealOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            origin: settings.link.origin.clone(),
            soft_limit: settings.link.soft_limit_bytes,
            kdf: settings.kdf.params(),
        }
    }
}

/// A finalized share link.
#[derive(Debug, Clone)]
pub struct SealedLink {
    pub url: Url,
    pub link: ShareLink,
    pub report: LinkReport,
}

/// Finalize a configuration into a share link.
///
/// Validates first; nothing is encrypted for an invalid configuration.
/// Key derivation and encryption run on the blocking pool. Every call uses a
/// fresh master key, so sealing the same configuration twice yields two
/// unrelated links.
///
/// # Errors
/// Returns `SealError::Validation` for an out-of-quota or malformed
/// configuration, or a crypto/link error if finalizing fails.
pub async fn seal(config: &SanctuaryConfig, options: &SealOptions) -> Result<SealedLink, SealError> {
    validate_config(config)?;

    let locked = !is_sentinel_passcode(&config.passcode);
    let config = config.clone();
    let kdf = options.kdf;
    let link = tokio::task::spawn_blocking(move || seal_blocking(config, kdf))
        .await
        .map_err(|e| SealError::Task(e.to_string()))??;

    let url = link.to_url(&options.origin)?;
    let report = LinkReport::measure(&url, options.soft_limit);
    if report.exceeds_soft_limit {
        warn!(
            total_len = report.total_len,
            soft_limit = options.soft_limit,
            "share link exceeds soft length limit"
        );
    }
    info!(locked, total_len = report.total_len, "sealed share link");

    Ok(SealedLink { url, link, report })
}

fn seal_blocking(mut config: SanctuaryConfig, kdf: KdfParams) -> Result<ShareLink, SealError> {
    let lock = if is_sentinel_passcode(&config.passcode) {
        None
    } else {
        let salt = PasscodeSalt::generate();
        let key = derive_key(&config.passcode, &salt, kdf)?;
        let lock = PasscodeLock {
            notes: encrypt_value(&config.notes, &key)?,
            video: encrypt_value(&config.video(), &key)?,
            salt,
            params: kdf,
        };
        config.notes.clear();
        config.video_url = None;
        config.passcode.clear();
        Some(lock)
    };

    let payload = OuterPayload::new(config, lock.as_ref());
    let master = SymmetricKey::generate();
    let envelope = encrypt_value(&payload, &master)?;
    Ok(ShareLink::new(envelope, master.export()))
}
