//! Configuration validation, run before anything is encrypted.
//!
//! Checks fail fast on the first problem. Nothing is clamped or trimmed:
//! a configuration that exceeds its plan is rejected, never shrunk to fit.

use std::collections::HashSet;

use chrono::FixedOffset;

use crate::model::{DayKey, Plan, SanctuaryConfig};
use crate::schedule::parse_instant;

/// Length of a passcode, in ASCII digits.
pub const PASSCODE_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} name is required")]
    MissingName(&'static str),
    #[error("totalDays must be between 1 and {max} for the {plan} plan, got {total_days}")]
    DaysOutOfRange {
        plan: Plan,
        total_days: u32,
        max: u32,
    },
    #[error("{field} references day {offset}, outside 0..{total_days}")]
    DayOutOfRange {
        field: &'static str,
        offset: u32,
        total_days: u32,
    },
    #[error("{count} notes exceed the {plan} plan limit of {max}")]
    TooManyNotes { plan: Plan, count: usize, max: usize },
    #[error("{count} gallery photos exceed the {plan} plan limit of {max}")]
    TooManyPhotos { plan: Plan, count: usize, max: usize },
    #[error("the {0} plan does not include video")]
    VideoNotAllowed(Plan),
    #[error("passcode must be exactly {PASSCODE_LEN} digits")]
    InvalidPasscode,
    #[error("note '{0}' has an hour outside 0..24")]
    InvalidHour(String),
    #[error("note id '{0}' is used more than once")]
    DuplicateNoteId(String),
    #[error("{field} '{value}' is not a YYYY-MM-DD or RFC 3339 date")]
    InvalidDate { field: &'static str, value: String },
}

/// Exactly four ASCII digits. No trimming, no other characters.
///
/// # Errors
/// Returns `ValidationError::InvalidPasscode` otherwise.
pub fn validate_passcode(passcode: &str) -> Result<(), ValidationError> {
    if passcode.len() == PASSCODE_LEN && passcode.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPasscode)
    }
}

fn check_day(field: &'static str, offset: u32, total_days: u32) -> Result<(), ValidationError> {
    if offset < total_days {
        Ok(())
    } else {
        Err(ValidationError::DayOutOfRange {
            field,
            offset,
            total_days,
        })
    }
}

fn check_keys<'a, V: 'a>(
    field: &'static str,
    keys: impl IntoIterator<Item = (&'a DayKey, V)>,
    total_days: u32,
) -> Result<(), ValidationError> {
    keys.into_iter()
        .try_for_each(|(key, _)| check_day(field, key.offset(), total_days))
}

/// Check a configuration against its plan quotas and structural rules.
///
/// # Errors
/// Returns the first `ValidationError` found.
pub fn validate_config(config: &SanctuaryConfig) -> Result<(), ValidationError> {
    let limits = config.limits();
    let plan = config.plan;

    if config.names.sender.trim().is_empty() {
        return Err(ValidationError::MissingName("sender"));
    }
    if config.names.recipient.trim().is_empty() {
        return Err(ValidationError::MissingName("recipient"));
    }

    let total_days = config.total_days;
    if total_days == 0 || total_days > limits.days {
        return Err(ValidationError::DaysOutOfRange {
            plan,
            total_days,
            max: limits.days,
        });
    }

    let utc = FixedOffset::east_opt(0);
    for (field, value) in [
        ("targetDate", &config.target_date),
        ("anniversaryDate", &config.anniversary_date),
    ] {
        let parsed = utc.and_then(|tz| parse_instant(value, tz).ok());
        if parsed.is_none() {
            return Err(ValidationError::InvalidDate {
                field,
                value: value.clone(),
            });
        }
    }

    validate_passcode(&config.passcode)?;

    if config.notes.len() > limits.notes {
        return Err(ValidationError::TooManyNotes {
            plan,
            count: config.notes.len(),
            max: limits.notes,
        });
    }
    let gallery = config.gallery_count();
    if gallery > limits.gallery {
        return Err(ValidationError::TooManyPhotos {
            plan,
            count: gallery,
            max: limits.gallery,
        });
    }
    if config.video().is_some() && !limits.video {
        return Err(ValidationError::VideoNotAllowed(plan));
    }

    check_keys("spotifyTracks", &config.spotify_tracks, total_days)?;
    check_keys("galleryImages", &config.gallery_images, total_days)?;

    let mut ids = HashSet::with_capacity(config.notes.len());
    for note in &config.notes {
        check_day("notes", note.day, total_days)?;
        if note.hour.is_some_and(|hour| hour >= 24) {
            return Err(ValidationError::InvalidHour(note.id.clone()));
        }
        if !ids.insert(note.id.as_str()) {
            return Err(ValidationError::DuplicateNoteId(note.id.clone()));
        }
    }

    Ok(())
}
