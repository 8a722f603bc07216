//! The gift configuration document and its plan tiers.
//!
//! Field names on the wire are camelCase so links produced by the browser
//! build and by this crate are interchangeable. Maps are `BTreeMap` so the
//! JSON form (and therefore the encrypted bytes' plaintext) is canonical.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purchase tier. Each tier carries its own resource quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Spark,
    Plus,
    Infinite,
    Viral,
}

/// Resource quotas for a [`Plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    /// Maximum countdown length.
    pub days: u32,
    pub notes: usize,
    /// Total gallery photos across all days.
    pub gallery: usize,
    /// Whether a video may be attached.
    pub video: bool,
    /// Whether the reveal page shows product branding.
    pub branding: bool,
}

impl Plan {
    #[must_use]
    pub const fn limits(self) -> PlanLimits {
        match self {
            Self::Spark => PlanLimits {
                days: 1,
                notes: 5,
                gallery: 10,
                video: false,
                branding: true,
            },
            Self::Plus => PlanLimits {
                days: 7,
                notes: 25,
                gallery: 30,
                video: false,
                branding: false,
            },
            Self::Infinite => PlanLimits {
                days: 14,
                notes: 500,
                gallery: 50,
                video: true,
                branding: false,
            },
            Self::Viral => PlanLimits {
                days: 7,
                notes: 25,
                gallery: 30,
                video: false,
                branding: true,
            },
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spark => "spark",
            Self::Plus => "plus",
            Self::Infinite => "infinite",
            Self::Viral => "viral",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known plan.
#[derive(Debug, thiserror::Error)]
#[error("unknown plan '{0}' (expected spark, plus, infinite or viral)")]
pub struct PlanParseError(String);

impl FromStr for Plan {
    type Err = PlanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spark" => Ok(Self::Spark),
            "plus" => Ok(Self::Plus),
            "infinite" => Ok(Self::Infinite),
            "viral" => Ok(Self::Viral),
            other => Err(PlanParseError(other.to_string())),
        }
    }
}

/// Day index relative to the target date, written `day<N>` on the wire.
///
/// `day0` is the culmination day; larger offsets are further before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(u32);

/// Error returned when a string is not a valid day key.
#[derive(Debug, thiserror::Error)]
#[error("invalid day key '{key}': {reason}")]
pub struct DayKeyError {
    key: String,
    reason: &'static str,
}

impl DayKey {
    #[must_use]
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    #[must_use]
    pub const fn offset(self) -> u32 {
        self.0
    }
}

impl FromStr for DayKey {
    type Err = DayKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| DayKeyError {
            key: s.to_string(),
            reason,
        };
        let digits = s.strip_prefix("day").ok_or_else(|| err("missing 'day' prefix"))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err("offset must be decimal digits"));
        }
        // One spelling per offset, otherwise day1 and day01 would both be keys
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(err("offset has leading zeros"));
        }
        digits
            .parse()
            .map(Self)
            .map_err(|_| err("offset out of range"))
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day{}", self.0)
    }
}

impl Serialize for DayKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Names {
    pub sender: String,
    pub recipient: String,
}

/// A time-gated message. `content` is HTML and is only ever rendered through
/// [`crate::render::sanitize_html`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    /// Day offset, same meaning as [`DayKey`].
    pub day: u32,
    /// Hour of the day the note was written for (informational).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    pub content: String,
}

impl Note {
    /// Create a note with a fresh random id.
    pub fn new(day: u32, content: impl Into<String>) -> Self {
        Self {
            id: format!("note-{}", Uuid::new_v4().simple()),
            day,
            hour: None,
            content: content.into(),
        }
    }
}

/// Browser builds write `""` for "no URL"; read it as absent.
fn empty_as_none<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

/// The logical gift document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanctuaryConfig {
    pub plan: Plan,
    pub theme: String,
    pub occasion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_question: Option<String>,
    pub names: Names,
    /// Culmination date, `YYYY-MM-DD` or RFC 3339.
    pub target_date: String,
    /// Reference date for the elapsed-time counter.
    pub anniversary_date: String,
    pub total_days: u32,
    #[serde(default)]
    pub spotify_tracks: BTreeMap<DayKey, String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub passcode: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub video_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub background_url: Option<String>,
    #[serde(default)]
    pub gallery_images: BTreeMap<DayKey, Vec<String>>,
    /// Opaque plan-entitlement proof, forwarded untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl SanctuaryConfig {
    #[must_use]
    pub const fn limits(&self) -> PlanLimits {
        self.plan.limits()
    }

    /// The attached video, if any. An empty URL is no video.
    #[must_use]
    pub fn video(&self) -> Option<&str> {
        self.video_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Total number of gallery photos across all days.
    #[must_use]
    pub fn gallery_count(&self) -> usize {
        self.gallery_images.values().map(Vec::len).sum()
    }

    /// Combined length of all note bodies.
    #[must_use]
    pub fn notes_content_len(&self) -> usize {
        self.notes.iter().map(|note| note.content.len()).sum()
    }

    /// Notes for one day, in document order.
    pub fn notes_for_day(&self, offset: u32) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |note| note.day == offset)
    }
}
