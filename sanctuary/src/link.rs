//! Share-link shape: `origin/?d=<ciphertext>&iv=<iv>#<key>`.
//!
//! The key lives only in the fragment, which browsers never send to a
//! server. The query carries the master-tier envelope. The codec never
//! truncates; oversized links are reported, not shortened.

use std::fmt;

use sanctuary_crypto::{decode_transport, DecodeError, EncryptedEnvelope, IV_LEN, KEY_LEN, TAG_LEN};
use serde::Serialize;
use url::Url;

use crate::model::SanctuaryConfig;

/// Default URL length above which a link is flagged as oversized.
pub const DEFAULT_SOFT_LIMIT: usize = 7_000;

/// Only wire version; `v` may be omitted.
pub const LINK_VERSION: &str = "1";

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("not a valid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("link is missing the '{0}' parameter")]
    MissingParam(&'static str),
    #[error("link repeats the '{0}' parameter")]
    DuplicateParam(String),
    #[error("unsupported link version '{0}'")]
    UnsupportedVersion(String),
    #[error("link is missing its key fragment")]
    MissingKey,
    #[error("link field '{field}' is not valid transport encoding")]
    Encoding {
        field: &'static str,
        #[source]
        source: DecodeError,
    },
}

/// The three transport strings that make up a share link.
#[derive(Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub envelope: EncryptedEnvelope,
    key: String,
}

impl ShareLink {
    #[must_use]
    pub const fn new(envelope: EncryptedEnvelope, key: String) -> Self {
        Self { envelope, key }
    }

    /// Master key in transport form.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Render the link against `origin`.
    ///
    /// # Errors
    /// Returns `LinkError::InvalidUrl` if `origin` does not parse.
    pub fn to_url(&self, origin: &str) -> Result<Url, LinkError> {
        let mut url = Url::parse(origin)?;
        url.set_path("/");
        url.query_pairs_mut()
            .clear()
            .append_pair("d", &self.envelope.ciphertext)
            .append_pair("iv", &self.envelope.iv);
        url.set_fragment(Some(&self.key));
        Ok(url)
    }

    /// Parse a share link.
    ///
    /// Every component must be present, non-empty and valid transport
    /// encoding. The decoded sizes are checked later, when the envelope is
    /// opened.
    ///
    /// # Errors
    /// Returns a `LinkError` naming the first missing or malformed part.
    pub fn parse(input: &str) -> Result<Self, LinkError> {
        let url = Url::parse(input.trim())?;

        let mut ciphertext = None;
        let mut iv = None;
        let mut version = None;
        for (name, value) in url.query_pairs() {
            let slot = match name.as_ref() {
                "d" => &mut ciphertext,
                "iv" => &mut iv,
                "v" => &mut version,
                _ => continue,
            };
            if slot.replace(value.into_owned()).is_some() {
                return Err(LinkError::DuplicateParam(name.into_owned()));
            }
        }

        if let Some(version) = version {
            if version != LINK_VERSION {
                return Err(LinkError::UnsupportedVersion(version));
            }
        }

        let ciphertext = non_empty(ciphertext).ok_or(LinkError::MissingParam("d"))?;
        let iv = non_empty(iv).ok_or(LinkError::MissingParam("iv"))?;
        let key = non_empty(url.fragment().map(str::to_string)).ok_or(LinkError::MissingKey)?;

        for (field, value) in [("d", &ciphertext), ("iv", &iv), ("key", &key)] {
            decode_transport(value).map_err(|source| LinkError::Encoding { field, source })?;
        }

        Ok(Self {
            envelope: EncryptedEnvelope { ciphertext, iv },
            key,
        })
    }

    /// Size report for this link rendered against `origin`.
    ///
    /// # Errors
    /// Returns `LinkError::InvalidUrl` if `origin` does not parse.
    pub fn report(&self, origin: &str, soft_limit: usize) -> Result<LinkReport, LinkError> {
        Ok(LinkReport::measure(&self.to_url(origin)?, soft_limit))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl fmt::Debug for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareLink")
            .field("ciphertext_len", &self.envelope.ciphertext.len())
            .field("iv", &self.envelope.iv)
            .field("key", &"..")
            .finish()
    }
}

/// Measured size of a rendered link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    pub query_len: usize,
    pub fragment_len: usize,
    pub total_len: usize,
    pub exceeds_soft_limit: bool,
}

impl LinkReport {
    #[must_use]
    pub fn measure(url: &Url, soft_limit: usize) -> Self {
        let total_len = url.as_str().len();
        Self {
            query_len: url.query().map_or(0, str::len),
            fragment_len: url.fragment().map_or(0, str::len),
            total_len,
            exceeds_soft_limit: total_len > soft_limit,
        }
    }
}

const fn transport_len(bytes: usize) -> usize {
    (bytes * 4 + 2) / 3
}

/// Approximate query + fragment length the configuration will produce once
/// sealed without a passcode, so callers can warn before finalizing.
///
/// # Errors
/// Returns an error if the configuration cannot be serialized.
pub fn estimate_encoded_len(config: &SanctuaryConfig) -> Result<usize, serde_json::Error> {
    let plaintext = serde_json::to_vec(config)?.len();
    // "d=" + "&iv=" in the query, the fragment has no prefix
    Ok(2 + transport_len(plaintext + TAG_LEN) + 4 + transport_len(IV_LEN) + transport_len(KEY_LEN))
}
