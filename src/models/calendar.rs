//! Time slots and unavailability calendars.
//!
//! # Time Model
//! Times are naive local date-times; the caller fixes the timezone.
//! Every slot is half-open `[start, end)`: two back-to-back slots
//! sharing a boundary instant do not overlap.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ConfigError;

/// A time interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSlot")]
pub struct TimeSlot {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[derive(Deserialize)]
struct RawTimeSlot {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<RawTimeSlot> for TimeSlot {
    type Error = ConfigError;

    fn try_from(raw: RawTimeSlot) -> Result<Self, Self::Error> {
        TimeSlot::new(raw.start, raw.end)
    }
}

impl TimeSlot {
    /// Creates a slot. Zero-length and inverted intervals are rejected.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ConfigError> {
        if start >= end {
            return Err(ConfigError::InvalidWindow(format!(
                "start {start} must be strictly before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Inclusive start.
    #[inline]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Exclusive end.
    #[inline]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Length of the slot.
    #[inline]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Whether an instant falls within this slot.
    #[inline]
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether `[start, end)` overlaps this slot.
    #[inline]
    pub fn overlaps_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        intervals_overlap(self.start, self.end, start, end)
    }

    /// Whether two slots overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.overlaps_range(other.start, other.end)
    }
}

/// Half-open overlap test: `[s1, e1)` and `[s2, e2)` share an instant.
#[inline]
pub fn intervals_overlap(
    s1: NaiveDateTime,
    e1: NaiveDateTime,
    s2: NaiveDateTime,
    e2: NaiveDateTime,
) -> bool {
    s1 < e2 && s2 < e1
}

/// Unavailable periods keyed by person or room id.
///
/// Read-only for the duration of a run. Ids without an entry are
/// always available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unavailability {
    blocked: HashMap<String, Vec<TimeSlot>>,
}

impl Unavailability {
    /// Creates an empty map (everyone always available).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a blocked period for `id`.
    pub fn with_blocked(mut self, id: impl Into<String>, slot: TimeSlot) -> Self {
        self.add_blocked(id, slot);
        self
    }

    /// Adds a blocked period for `id`.
    pub fn add_blocked(&mut self, id: impl Into<String>, slot: TimeSlot) {
        self.blocked.entry(id.into()).or_default().push(slot);
    }

    /// Blocked periods for `id`.
    pub fn blocked_for(&self, id: &str) -> &[TimeSlot] {
        self.blocked.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `[start, end)` overlaps any blocked period of `id`.
    pub fn is_blocked(&self, id: &str, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.blocked_for(id)
            .iter()
            .any(|slot| slot.overlaps_range(start, end))
    }

    /// Number of ids with at least one blocked period.
    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    /// Whether no blocked periods are recorded.
    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}

impl FromIterator<(String, Vec<TimeSlot>)> for Unavailability {
    fn from_iter<I: IntoIterator<Item = (String, Vec<TimeSlot>)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, slots) in iter {
            map.blocked.entry(id).or_default().extend(slots);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_time_slot() {
        let s = TimeSlot::new(at(17, 8), at(17, 10)).unwrap();
        assert_eq!(s.duration(), TimeDelta::hours(2));
        assert!(s.contains(at(17, 8)));
        assert!(s.contains(at(17, 9)));
        assert!(!s.contains(at(17, 10))); // exclusive end
        assert!(!s.contains(at(17, 7)));
    }

    #[test]
    fn test_rejects_empty_and_inverted() {
        assert!(TimeSlot::new(at(17, 8), at(17, 8)).is_err());
        assert!(TimeSlot::new(at(17, 9), at(17, 8)).is_err());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = TimeSlot::new(at(17, 8), at(17, 9)).unwrap();
        let b = TimeSlot::new(at(17, 9), at(17, 10)).unwrap(); // touching
        let c = TimeSlot::new(at(17, 8), at(17, 10)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_unavailability_lookup() {
        let map = Unavailability::new()
            .with_blocked("101", TimeSlot::new(at(17, 8), at(17, 12)).unwrap());

        assert!(map.is_blocked("101", at(17, 11), at(17, 12)));
        assert!(!map.is_blocked("101", at(17, 12), at(17, 13)));
        assert!(!map.is_blocked("102", at(17, 8), at(17, 9)));
        assert_eq!(map.blocked_for("102").len(), 0);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<TimeSlot, _> =
            serde_json::from_str(r#"{"start":"2024-06-17T08:00:00","end":"2024-06-17T09:00:00"}"#);
        assert!(ok.is_ok());

        let inverted: Result<TimeSlot, _> =
            serde_json::from_str(r#"{"start":"2024-06-17T09:00:00","end":"2024-06-17T08:00:00"}"#);
        assert!(inverted.is_err());
    }

    #[test]
    fn test_unavailability_from_json() {
        let map: Unavailability = serde_json::from_str(
            r#"{"profA":[{"start":"2024-06-17T08:00:00","end":"2024-06-17T09:00:00"}]}"#,
        )
        .unwrap();
        assert!(map.is_blocked("profA", at(17, 8), at(17, 9)));
    }
}
