//! Schedule conflict analysis and fitness.
//!
//! One routine counts conflicts for both the genetic search (every
//! generation) and the caller's final acceptance check, so the reported
//! numbers and the optimization objective cannot diverge.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Room conflicts | Overlapping defense pairs sharing a room |
//! | Teacher conflicts | Overlapping defense pairs sharing any role holder |
//! | Unavailability conflicts | Per defense: +1 if its room is blocked, +1 if any role holder is blocked |
//! | Idle time | Per person, sum of positive gaps between consecutive defenses |
//!
//! `penalty = 1 + HARD * (room + teacher + unavailability) + IDLE * idle_hours`
//! and `fitness = 1 / penalty`.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AnalysisError;
use crate::models::{intervals_overlap, Defense, Schedule, Unavailability};

/// Penalty per hard-constraint violation.
pub const HARD_CONSTRAINT_PENALTY: f64 = 10_000.0;

/// Penalty per hour of faculty idle time.
pub const IDLE_WEIGHT_PER_HOUR: f64 = 1.0;

/// Unavailability count charged for a defense missing its room or start.
pub const MALFORMED_DEFENSE_PENALTY: usize = 100;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Raw conflict counts of one schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictCounts {
    pub room_conflicts: usize,
    pub teacher_conflicts: usize,
    pub unavailability_conflicts: usize,
    /// Total faculty idle time (ms).
    pub idle_ms: i64,
}

impl ConflictCounts {
    /// Sum of hard-constraint violations.
    #[inline]
    pub fn hard_conflicts(&self) -> usize {
        self.room_conflicts + self.teacher_conflicts + self.unavailability_conflicts
    }

    /// Idle time in hours.
    #[inline]
    pub fn idle_hours(&self) -> f64 {
        self.idle_ms as f64 / MS_PER_HOUR
    }

    /// Weighted penalty, always >= 1.
    pub fn penalty(&self) -> f64 {
        1.0 + HARD_CONSTRAINT_PENALTY * self.hard_conflicts() as f64
            + IDLE_WEIGHT_PER_HOUR * self.idle_hours()
    }

    /// Fitness in `(0, 1]`; higher is better.
    #[inline]
    pub fn fitness(&self) -> f64 {
        1.0 / self.penalty()
    }
}

/// Analysis report of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub fitness: f64,
    pub room_conflicts: usize,
    pub teacher_conflicts: usize,
    pub unavailability_conflicts: usize,
    pub idle_time_hours: f64,
}

impl Analysis {
    /// Sum of hard-constraint violations.
    pub fn hard_conflicts(&self) -> usize {
        self.room_conflicts + self.teacher_conflicts + self.unavailability_conflicts
    }

    /// Whether the schedule violates no hard constraint.
    pub fn is_feasible(&self) -> bool {
        self.hard_conflicts() == 0
    }
}

impl From<ConflictCounts> for Analysis {
    fn from(c: ConflictCounts) -> Self {
        Self {
            fitness: c.fitness(),
            room_conflicts: c.room_conflicts,
            teacher_conflicts: c.teacher_conflicts,
            unavailability_conflicts: c.unavailability_conflicts,
            idle_time_hours: c.idle_hours(),
        }
    }
}

/// Scores schedules against fixed unavailability calendars.
///
/// Stateless between calls: the same input always yields the same output.
#[derive(Debug, Clone)]
pub struct ScheduleAnalyzer {
    person_unavailability: Unavailability,
    room_unavailability: Unavailability,
    duration: TimeDelta,
}

impl ScheduleAnalyzer {
    /// Creates an analyzer.
    pub fn new(
        person_unavailability: Unavailability,
        room_unavailability: Unavailability,
        duration: TimeDelta,
    ) -> Self {
        Self {
            person_unavailability,
            room_unavailability,
            duration,
        }
    }

    /// Defense length used for overlap checks.
    pub fn duration(&self) -> TimeDelta {
        self.duration
    }

    /// Counts conflicts and idle time.
    ///
    /// Defenses missing a room or start are charged
    /// [`MALFORMED_DEFENSE_PENALTY`] and excluded from pairwise checks.
    pub fn conflicts(&self, defenses: &[Defense]) -> ConflictCounts {
        let mut counts = ConflictCounts::default();

        for (i, d1) in defenses.iter().enumerate() {
            let (Some(room1), Some(s1)) = (d1.room_id(), d1.start) else {
                counts.unavailability_conflicts += MALFORMED_DEFENSE_PENALTY;
                continue;
            };
            let e1 = s1 + self.duration;

            if self.room_unavailability.is_blocked(room1, s1, e1) {
                counts.unavailability_conflicts += 1;
            }
            if d1
                .involved_persons()
                .any(|p| self.person_unavailability.is_blocked(p, s1, e1))
            {
                counts.unavailability_conflicts += 1;
            }

            for d2 in &defenses[i + 1..] {
                let (Some(room2), Some(s2)) = (d2.room_id(), d2.start) else {
                    continue;
                };
                if !intervals_overlap(s1, e1, s2, s2 + self.duration) {
                    continue;
                }
                if room1 == room2 {
                    counts.room_conflicts += 1;
                }
                if d1
                    .involved_persons()
                    .any(|p| d2.involved_persons().any(|q| q == p))
                {
                    counts.teacher_conflicts += 1;
                }
            }
        }

        counts.idle_ms = self.idle_time(defenses).num_milliseconds();
        counts
    }

    /// Fitness of a defense list (higher is better).
    #[inline]
    pub fn fitness(&self, defenses: &[Defense]) -> f64 {
        self.conflicts(defenses).fitness()
    }

    /// Full analysis of a schedule.
    ///
    /// # Errors
    /// [`AnalysisError::EmptySchedule`] for an empty schedule and
    /// [`AnalysisError::Malformed`] if any defense lacks a room or start.
    pub fn analyze(&self, schedule: &Schedule) -> Result<Analysis, AnalysisError> {
        if schedule.is_empty() {
            return Err(AnalysisError::EmptySchedule);
        }
        let unplaced = schedule.unplaced_ids();
        if !unplaced.is_empty() {
            return Err(AnalysisError::Malformed(unplaced));
        }
        Ok(self.conflicts(&schedule.defenses).into())
    }

    /// Sum over persons of positive gaps between consecutive defenses.
    fn idle_time(&self, defenses: &[Defense]) -> TimeDelta {
        let mut per_person: HashMap<&str, Vec<NaiveDateTime>> = HashMap::new();
        for d in defenses {
            let Some(start) = d.start else { continue };
            for p in d.involved_persons() {
                per_person.entry(p).or_default().push(start);
            }
        }

        let mut total = TimeDelta::zero();
        for starts in per_person.values_mut() {
            if starts.len() < 2 {
                continue;
            }
            starts.sort_unstable();
            for pair in starts.windows(2) {
                let prev_end = pair[0] + self.duration;
                if pair[1] > prev_end {
                    total += pair[1] - prev_end;
                }
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeSlot;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 17)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn defense(id: &str, people: [&str; 3], room: &str, h: u32) -> Defense {
        Defense::new(id, "")
            .with_supervisor(people[0])
            .with_reviewer(people[1])
            .with_president(people[2])
            .with_room(room)
            .with_start(at(h))
    }

    fn analyzer() -> ScheduleAnalyzer {
        ScheduleAnalyzer::new(
            Unavailability::new(),
            Unavailability::new(),
            TimeDelta::hours(1),
        )
    }

    #[test]
    fn test_clean_schedule() {
        let s = Schedule::new(vec![
            defense("D1", ["A", "B", "C"], "101", 8),
            defense("D2", ["D", "E", "F"], "101", 9),
        ]);
        let a = analyzer().analyze(&s).unwrap();
        assert!(a.is_feasible());
        assert_eq!(a.idle_time_hours, 0.0);
        assert!((a.fitness - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_room_and_teacher_conflicts() {
        let s = Schedule::new(vec![
            defense("D1", ["A", "B", "C"], "101", 8),
            defense("D2", ["A", "E", "F"], "101", 8),
            defense("D3", ["G", "H", "I"], "102", 8),
        ]);
        let c = analyzer().conflicts(&s.defenses);
        assert_eq!(c.room_conflicts, 1);
        assert_eq!(c.teacher_conflicts, 1);
        assert_eq!(c.unavailability_conflicts, 0);
    }

    #[test]
    fn test_back_to_back_is_not_a_conflict() {
        let s = Schedule::new(vec![
            defense("D1", ["A", "B", "C"], "101", 8),
            defense("D2", ["A", "B", "C"], "101", 9),
        ]);
        let c = analyzer().conflicts(&s.defenses);
        assert_eq!(c.room_conflicts, 0);
        assert_eq!(c.teacher_conflicts, 0);
    }

    #[test]
    fn test_idle_time() {
        // A: 8-9, then 11-12 → 2h gap; B: 8-9, 11-12 → 2h; C only once.
        let s = Schedule::new(vec![
            defense("D1", ["A", "B", "C"], "101", 8),
            defense("D2", ["A", "B", "D"], "101", 11),
        ]);
        let c = analyzer().conflicts(&s.defenses);
        assert_eq!(c.idle_ms, 4 * 3_600_000);
        assert!((c.idle_hours() - 4.0).abs() < 1e-12);
        assert!((c.penalty() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_unavailability_counts_once_per_category() {
        let block = TimeSlot::new(at(8), at(10)).unwrap();
        let a = ScheduleAnalyzer::new(
            Unavailability::new()
                .with_blocked("A", block)
                .with_blocked("B", block),
            Unavailability::new().with_blocked("101", block),
            TimeDelta::hours(1),
        );
        let s = Schedule::new(vec![defense("D1", ["A", "B", "C"], "101", 9)]);
        assert_eq!(a.conflicts(&s.defenses).unavailability_conflicts, 2);

        let free = Schedule::new(vec![defense("D1", ["A", "B", "C"], "101", 10)]);
        assert_eq!(a.conflicts(&free.defenses).unavailability_conflicts, 0);
    }

    #[test]
    fn test_more_room_conflicts_lower_fitness() {
        let one = ConflictCounts {
            room_conflicts: 1,
            ..Default::default()
        };
        let two = ConflictCounts {
            room_conflicts: 2,
            ..Default::default()
        };
        assert!(two.fitness() < one.fitness());
        assert!(one.fitness() < ConflictCounts::default().fitness());

        // Any hard violation outweighs a full working day of idle time.
        let idle = ConflictCounts {
            idle_ms: 8 * 3_600_000,
            ..Default::default()
        };
        assert!(one.fitness() < idle.fitness());
    }

    #[test]
    fn test_malformed_penalised_and_rejected() {
        let s = Schedule::new(vec![
            defense("D1", ["A", "B", "C"], "101", 8),
            Defense::new("D2", "")
                .with_supervisor("A")
                .with_reviewer("B")
                .with_president("C"),
        ]);
        let c = analyzer().conflicts(&s.defenses);
        assert_eq!(c.unavailability_conflicts, MALFORMED_DEFENSE_PENALTY);
        assert_eq!(c.teacher_conflicts, 0);

        assert_eq!(
            analyzer().analyze(&s),
            Err(AnalysisError::Malformed(vec!["D2".into()]))
        );
        assert_eq!(
            analyzer().analyze(&Schedule::default()),
            Err(AnalysisError::EmptySchedule)
        );
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let s = Schedule::new(vec![
            defense("D1", ["A", "B", "C"], "101", 8),
            defense("D2", ["A", "E", "F"], "101", 8),
            defense("D3", ["A", "H", "I"], "102", 14),
        ]);
        let a = analyzer();
        assert_eq!(a.analyze(&s), a.analyze(&s));
    }
}
