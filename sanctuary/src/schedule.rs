//! Reveal schedule engine.
//!
//! Pure functions over an explicit `now`. [`RevealGate`] bundles a schedule
//! with an injected [`Clock`] and the client-local [`DebugOverride`], so each
//! preview owns its own reference dates and nothing is global.
//!
//! Day boundaries are midnights in one fixed UTC offset chosen by the
//! caller. A `YYYY-MM-DD` date is a calendar date in that offset; an RFC 3339
//! timestamp is converted into it first.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Timelike, Utc};
use serde::Serialize;

use crate::model::SanctuaryConfig;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant (previews, tests, the CLI `--at` flag).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid date '{0}': expected YYYY-MM-DD or RFC 3339")]
    InvalidDate(String),
    #[error("invalid UTC offset '{0}': expected Z or ±HH:MM")]
    InvalidOffset(String),
}

/// Parse `Z`, `UTC`, or `±HH:MM` into a fixed offset.
///
/// # Errors
/// Returns `ScheduleError::InvalidOffset` for anything else.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ScheduleError> {
    let invalid = || ScheduleError::InvalidOffset(value.to_string());
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn midnight(date: NaiveDate, tz: FixedOffset) -> Option<DateTime<FixedOffset>> {
    date.and_hms_opt(0, 0, 0)?.and_local_timezone(tz).single()
}

/// Parse a configuration date into an instant in `tz`.
///
/// # Errors
/// Returns `ScheduleError::InvalidDate` if the value is neither form.
pub fn parse_instant(value: &str, tz: FixedOffset) -> Result<DateTime<FixedOffset>, ScheduleError> {
    let invalid = || ScheduleError::InvalidDate(value.to_string());
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return midnight(date, tz).ok_or_else(invalid);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&tz))
        .map_err(|_| invalid())
}

/// Remaining time until a day unlocks. Hours are not wrapped at 24.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Countdown {
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

/// Time since the anniversary. Each unit is floored independently against
/// its own cycle: years, months mod 12, days mod 30, hours mod 24, minutes
/// mod 60, seconds mod 60.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Elapsed {
    pub years: u64,
    pub months: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

/// Target and anniversary instants for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealSchedule {
    target_start: DateTime<FixedOffset>,
    anniversary: DateTime<FixedOffset>,
}

impl RevealSchedule {
    /// Build a schedule from raw date strings.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidDate` if either date does not parse.
    pub fn new(target: &str, anniversary: &str, tz: FixedOffset) -> Result<Self, ScheduleError> {
        let target = parse_instant(target, tz)?;
        let target_start =
            midnight(target.date_naive(), tz).ok_or_else(|| ScheduleError::InvalidDate(target.to_rfc3339()))?;
        Ok(Self {
            target_start,
            anniversary: parse_instant(anniversary, tz)?,
        })
    }

    /// Build a schedule from a configuration's dates.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidDate` if either date does not parse.
    pub fn from_config(config: &SanctuaryConfig, tz: FixedOffset) -> Result<Self, ScheduleError> {
        Self::new(&config.target_date, &config.anniversary_date, tz)
    }

    /// Start of the culmination day.
    #[must_use]
    pub const fn target_start(&self) -> DateTime<FixedOffset> {
        self.target_start
    }

    /// Instant at which `offset` unlocks, `None` if it precedes the
    /// representable range (such a day is always unlocked).
    #[must_use]
    pub fn unlock_at(&self, offset: u32) -> Option<DateTime<FixedOffset>> {
        self.target_start.checked_sub_days(Days::new(u64::from(offset)))
    }

    /// `now >= start_of_day(target) - offset days`.
    #[must_use]
    pub fn is_day_unlocked(&self, offset: u32, now: DateTime<Utc>) -> bool {
        self.unlock_at(offset)
            .map_or(true, |at| now >= at.with_timezone(&Utc))
    }

    /// Floored countdown to the unlock instant; all zero once unlocked.
    #[must_use]
    pub fn time_until_offset(&self, offset: u32, now: DateTime<Utc>) -> Countdown {
        let Some(at) = self.unlock_at(offset) else {
            return Countdown::default();
        };
        let remaining = (at.with_timezone(&Utc) - now).num_seconds();
        let Ok(remaining) = u64::try_from(remaining) else {
            return Countdown::default();
        };
        Countdown {
            hours: remaining / 3600,
            minutes: (remaining % 3600) / 60,
            seconds: remaining % 60,
        }
    }

    /// Whether the culmination day has started.
    #[must_use]
    pub fn is_target_met(&self, now: DateTime<Utc>) -> bool {
        now >= self.target_start.with_timezone(&Utc)
    }

    /// Elapsed time since the anniversary, all zero before it.
    #[must_use]
    pub fn elapsed_since_anniversary(&self, now: DateTime<Utc>) -> Elapsed {
        let start = self.anniversary;
        let now = now.with_timezone(start.offset());
        let Ok(total) = u64::try_from((now - start).num_seconds()) else {
            return Elapsed::default();
        };

        let mut months = i64::from(now.year() - start.year()) * 12
            + i64::from(now.month()) - i64::from(start.month());
        let now_in_month = (now.day(), now.num_seconds_from_midnight());
        let start_in_month = (start.day(), start.num_seconds_from_midnight());
        if now_in_month < start_in_month {
            months -= 1;
        }
        let months = u64::try_from(months).unwrap_or(0);

        Elapsed {
            years: months / 12,
            months: months % 12,
            days: (total / 86_400) % 30,
            hours: (total / 3_600) % 24,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }
}

/// Client-local switch that forces every day open.
///
/// Only constructed from an explicit opt-in (the `debug.unlock_all` setting
/// or the CLI `--debug-unlock-all` flag). Never consulted by entitlement or
/// decryption code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DebugOverride {
    #[default]
    Off,
    UnlockAll,
}

impl DebugOverride {
    #[must_use]
    pub const fn from_flag(unlock_all: bool) -> Self {
        if unlock_all {
            Self::UnlockAll
        } else {
            Self::Off
        }
    }
}

/// A schedule bound to a clock and a debug override; what rendering uses.
#[derive(Clone)]
pub struct RevealGate {
    schedule: RevealSchedule,
    clock: Arc<dyn Clock>,
    debug: DebugOverride,
}

impl RevealGate {
    pub fn new(schedule: RevealSchedule, clock: Arc<dyn Clock>) -> Self {
        Self {
            schedule,
            clock,
            debug: DebugOverride::Off,
        }
    }

    #[must_use]
    pub const fn with_debug(mut self, debug: DebugOverride) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub const fn schedule(&self) -> &RevealSchedule {
        &self.schedule
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn is_day_unlocked(&self, offset: u32) -> bool {
        self.debug == DebugOverride::UnlockAll
            || self.schedule.is_day_unlocked(offset, self.clock.now())
    }

    #[must_use]
    pub fn time_until_offset(&self, offset: u32) -> Countdown {
        if self.debug == DebugOverride::UnlockAll {
            return Countdown::default();
        }
        self.schedule.time_until_offset(offset, self.clock.now())
    }

    #[must_use]
    pub fn is_target_met(&self) -> bool {
        self.schedule.is_target_met(self.clock.now())
    }

    #[must_use]
    pub fn elapsed_since_anniversary(&self) -> Elapsed {
        self.schedule.elapsed_since_anniversary(self.clock.now())
    }
}

impl std::fmt::Debug for RevealGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealGate")
            .field("schedule", &self.schedule)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
