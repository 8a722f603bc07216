//! Render pipeline: schedule-gated, sanitized view of a configuration.
//!
//! Note bodies are user-authored HTML from the link. [`SafeHtml`] can only
//! be produced by [`sanitize_html`], and [`RevealView`] only carries
//! `SafeHtml` for anything that will be interpreted as markup.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::model::{DayKey, SanctuaryConfig};
use crate::schedule::{Countdown, Elapsed, RevealGate};

/// HTML that has been through the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SafeHtml(String);

impl SafeHtml {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn policy() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::empty();
    builder
        .add_tags(["p", "br", "b", "strong", "i", "em", "u", "s", "span", "a", "ul", "ol", "li"])
        .clean_content_tags(HashSet::from(["script", "style"]))
        .add_tag_attributes("a", ["href"])
        .url_schemes(HashSet::from(["http", "https", "mailto"]))
        .link_rel(Some("noopener noreferrer"));
    builder
}

/// Strip everything outside a small inline-formatting allow-list.
#[must_use]
pub fn sanitize_html(input: &str) -> SafeHtml {
    SafeHtml(policy().clean(input).to_string())
}

/// Spotify track id reduced to ASCII alphanumerics; `None` if nothing is left.
#[must_use]
pub fn track_id(raw: &str) -> Option<String> {
    let id: String = raw.chars().filter(char::is_ascii_alphanumeric).collect();
    (!id.is_empty()).then_some(id)
}

/// One day of the countdown as the viewer may see it right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub offset: u32,
    pub unlocked: bool,
    pub countdown: Countdown,
    /// Empty fields below while `unlocked` is false.
    pub track: Option<String>,
    pub notes: Vec<SafeHtml>,
    pub gallery: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealView {
    /// "For {recipient}, from {sender}".
    pub header: SafeHtml,
    pub question: Option<SafeHtml>,
    pub target_met: bool,
    pub elapsed: Elapsed,
    pub branding: bool,
    pub background_url: Option<String>,
    pub video_url: Option<String>,
    /// Day offsets from the furthest day down to the culmination day.
    pub days: Vec<DayView>,
}

impl RevealView {
    /// Build the view for `config` as of the gate's clock.
    #[must_use]
    pub fn build(config: &SanctuaryConfig, gate: &RevealGate) -> Self {
        let days = (0..config.total_days)
            .rev()
            .map(|offset| day_view(config, gate, offset))
            .collect();

        Self {
            header: sanitize_html(&format!(
                "For {}, from {}",
                config.names.recipient, config.names.sender
            )),
            question: config.custom_question.as_deref().map(sanitize_html),
            target_met: gate.is_target_met(),
            elapsed: gate.elapsed_since_anniversary(),
            branding: config.limits().branding,
            background_url: config.background_url.clone(),
            video_url: config.video().map(str::to_string),
            days,
        }
    }
}

fn day_view(config: &SanctuaryConfig, gate: &RevealGate, offset: u32) -> DayView {
    if !gate.is_day_unlocked(offset) {
        return DayView {
            offset,
            unlocked: false,
            countdown: gate.time_until_offset(offset),
            track: None,
            notes: Vec::new(),
            gallery: Vec::new(),
        };
    }

    let key = DayKey::new(offset);
    DayView {
        offset,
        unlocked: true,
        countdown: Countdown::default(),
        track: config.spotify_tracks.get(&key).and_then(|id| track_id(id)),
        notes: config
            .notes_for_day(offset)
            .map(|note| sanitize_html(&note.content))
            .collect(),
        gallery: config.gallery_images.get(&key).cloned().unwrap_or_default(),
    }
}
