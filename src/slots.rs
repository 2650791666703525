//! Defense slot policy and random start generation.
//!
//! Defenses start on the hour, at one of a fixed set of allowed hours
//! (business hours without the lunch slot), optionally never on a weekend.
//!
//! # Generation
//! 1. Draw a uniform instant in the window (second resolution).
//! 2. Keep its date, replace the time with a random allowed hour.
//! 3. Accept if the whole defense starting there fits in the window.
//!
//! After [`MAX_GENERATION_ATTEMPTS`] misses the earliest allowed start in
//! the window is used; if the window holds none, the window start snapped
//! to the nearest allowed hour.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Weekday};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::models::TimeSlot;

/// Allowed start hours: 08:00 to 16:00, skipping 12:00.
pub const DEFAULT_ALLOWED_HOURS: [u32; 8] = [8, 9, 10, 11, 13, 14, 15, 16];

/// Length of one defense in minutes.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Longest accepted defense: one day.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

/// Random draws before falling back to a deterministic start.
pub const MAX_GENERATION_ATTEMPTS: usize = 100;

/// Where and how long defenses may be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotPolicy {
    /// Hours of day at which a defense may start.
    pub allowed_hours: Vec<u32>,
    /// Reject Saturday and Sunday starts.
    pub skip_weekends: bool,
    /// Defense length in minutes.
    pub duration_minutes: i64,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            allowed_hours: DEFAULT_ALLOWED_HOURS.to_vec(),
            skip_weekends: false,
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

impl SlotPolicy {
    /// Sets the allowed start hours.
    pub fn with_allowed_hours(mut self, hours: Vec<u32>) -> Self {
        self.allowed_hours = hours;
        self
    }

    /// Enables or disables the weekend rule.
    pub fn with_skip_weekends(mut self, skip: bool) -> Self {
        self.skip_weekends = skip;
        self
    }

    /// Sets the defense length.
    pub fn with_duration_minutes(mut self, minutes: i64) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// Checks that hours are valid and the duration is within one day.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_hours.is_empty() {
            return Err(ConfigError::NoAllowedHours);
        }
        if let Some(&bad) = self.allowed_hours.iter().find(|&&h| h > 23) {
            return Err(ConfigError::InvalidHour(bad));
        }
        if !(1..=MAX_DURATION_MINUTES).contains(&self.duration_minutes) {
            return Err(ConfigError::InvalidDuration);
        }
        Ok(())
    }

    /// Length of one defense, clamped to `[0, 24h]`.
    #[inline]
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::minutes(self.duration_minutes.clamp(0, MAX_DURATION_MINUTES))
    }

    /// Whether defenses may be held on `day`.
    #[inline]
    pub fn is_allowed_day(&self, day: NaiveDate) -> bool {
        !self.skip_weekends || !matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Whether `start` is on an allowed hour, on the hour, on an allowed day.
    pub fn is_allowed_start(&self, start: NaiveDateTime) -> bool {
        start.minute() == 0
            && start.second() == 0
            && start.nanosecond() == 0
            && self.allowed_hours.contains(&start.hour())
            && self.is_allowed_day(start.date())
    }

    /// Whether a defense starting at `start` lies entirely in `window`.
    ///
    /// Shared by generation, fallback and input validation.
    pub fn fits(&self, window: &TimeSlot, start: NaiveDateTime) -> bool {
        window.contains(start)
            && start
                .checked_add_signed(self.duration())
                .is_some_and(|end| end <= window.end())
    }

    /// Draws a random allowed start whose defense fits in `window`.
    ///
    /// Never fails: degenerate windows resolve through the fallback.
    pub fn generate_start<R: Rng + ?Sized>(&self, window: &TimeSlot, rng: &mut R) -> NaiveDateTime {
        let start_secs = window.start().and_utc().timestamp();
        let end_secs = window.end().and_utc().timestamp();

        if start_secs < end_secs {
            for _ in 0..MAX_GENERATION_ATTEMPTS {
                let secs = rng.random_range(start_secs..end_secs);
                let Some(instant) = DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
                else {
                    continue;
                };
                let Some(&hour) = self.allowed_hours.choose(rng) else {
                    break;
                };
                let Some(candidate) = instant.date().and_hms_opt(hour, 0, 0) else {
                    continue;
                };
                if self.fits(window, candidate) && self.is_allowed_day(candidate.date()) {
                    return candidate;
                }
            }
        }

        let fallback = self.fallback_start(window);
        warn!(
            attempts = MAX_GENERATION_ATTEMPTS,
            %fallback,
            "no random allowed start found in window, using fallback"
        );
        fallback
    }

    /// Earliest allowed start whose defense fits in `window`, else the
    /// window start snapped to the nearest allowed hour.
    pub fn fallback_start(&self, window: &TimeSlot) -> NaiveDateTime {
        let mut hours = self.allowed_hours.clone();
        hours.sort_unstable();
        hours.dedup();

        let mut day = window.start().date();
        while day <= window.end().date() {
            if self.is_allowed_day(day) {
                let earliest = hours
                    .iter()
                    .filter_map(|&h| day.and_hms_opt(h, 0, 0))
                    .find(|t| self.fits(window, *t));
                if let Some(t) = earliest {
                    return t;
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        let start = window.start();
        hours
            .iter()
            .min_by_key(|&&h| (h as i64 - start.hour() as i64).abs())
            .and_then(|&h| start.date().and_hms_opt(h, 0, 0))
            .unwrap_or(start)
    }
}
