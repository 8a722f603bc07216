use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use sanctuary_crypto::KdfParams;
use serde::{Deserialize, Serialize};

use crate::schedule::parse_utc_offset;

/// Tool configuration loaded from multiple sources.
///
/// Configuration is loaded in priority order (lowest to highest):
/// 1. Struct defaults
/// 2. sanctuary.yaml file (if exists)
/// 3. Environment variables with SANCTUARY_ prefix (always wins)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub link: LinkSettings,
    #[serde(default)]
    pub kdf: KdfSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub debug: DebugSettings,
    #[serde(default)]
    pub verifier: VerifierSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkSettings {
    /// Origin the share link points at (scheme + host, no path).
    #[serde(default = "default_origin")]
    pub origin: String,

    /// URL length above which a link is reported as oversized.
    #[serde(default = "default_soft_limit")]
    pub soft_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KdfSettings {
    /// Argon2id memory cost in KiB.
    #[serde(default = "default_m_cost")]
    pub m_cost: u32,
    /// Argon2id passes.
    #[serde(default = "default_t_cost")]
    pub t_cost: u32,
    /// Argon2id lanes.
    #[serde(default = "default_p_cost")]
    pub p_cost: u32,
}

impl KdfSettings {
    #[must_use]
    pub const fn params(&self) -> KdfParams {
        KdfParams {
            m_cost: self.m_cost,
            t_cost: self.t_cost,
            p_cost: self.p_cost,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleSettings {
    /// Offset whose midnights are day boundaries: `Z` or `±HH:MM`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DebugSettings {
    /// Force every day open in previews. Never affects entitlement.
    /// Enable via `SANCTUARY_DEBUG__UNLOCK_ALL=true`
    #[serde(default)]
    pub unlock_all: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerifierSettings {
    /// Base URL of the plan signature verifier.
    #[serde(default = "default_verifier_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level filter (debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_origin() -> String {
    "https://sanctuary.example".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_soft_limit() -> usize {
    7_000
}

#[allow(clippy::missing_const_for_fn)]
fn default_m_cost() -> u32 {
    KdfParams::DEFAULT.m_cost
}

#[allow(clippy::missing_const_for_fn)]
fn default_t_cost() -> u32 {
    KdfParams::DEFAULT.t_cost
}

#[allow(clippy::missing_const_for_fn)]
fn default_p_cost() -> u32 {
    KdfParams::DEFAULT.p_cost
}

fn default_utc_offset() -> String {
    "Z".to_string()
}

fn default_verifier_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            soft_limit_bytes: default_soft_limit(),
        }
    }
}

impl Default for KdfSettings {
    fn default() -> Self {
        Self {
            m_cost: default_m_cost(),
            t_cost: default_t_cost(),
            p_cost: default_p_cost(),
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            base_url: default_verifier_base_url(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl Settings {
    /// Load configuration from all sources.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("sanctuary.yaml")
    }

    /// Load configuration with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let settings: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed("SANCTUARY_").split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = url::Url::parse(&self.link.origin).map_err(|e| {
            ConfigError::Validation(format!(
                "link.origin '{}' is not a valid URL: {e}",
                self.link.origin
            ))
        })?;
        if origin.scheme() != "http" && origin.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "link.origin must start with http:// or https://, got '{}'",
                self.link.origin
            )));
        }
        if origin.query().is_some() || origin.fragment().is_some() {
            return Err(ConfigError::Validation(
                "link.origin cannot carry a query or fragment".into(),
            ));
        }

        if self.link.soft_limit_bytes == 0 {
            return Err(ConfigError::Validation(
                "link.soft_limit_bytes cannot be 0".into(),
            ));
        }

        self.kdf
            .params()
            .validate()
            .map_err(|e| ConfigError::Validation(format!("kdf: {e}")))?;

        parse_utc_offset(&self.schedule.utc_offset)
            .map_err(|e| ConfigError::Validation(format!("schedule.utc_offset: {e}")))?;

        if !self.verifier.base_url.starts_with("http://")
            && !self.verifier.base_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(format!(
                "verifier.base_url must start with http:// or https://, got '{}'",
                self.verifier.base_url
            )));
        }

        Ok(())
    }
}
