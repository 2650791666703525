//! Schedule (solution) model.
//!
//! A schedule is the ordered set of defenses of one optimization run.
//! It is the individual of the genetic population: cloned whenever it is
//! selected as a parent or kept as an elite, so no two population slots
//! ever share a defense.

use serde::{Deserialize, Serialize};

use super::Defense;

/// An ordered collection of defenses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    /// Defenses in template order.
    pub defenses: Vec<Defense>,
}

impl Schedule {
    /// Creates a schedule from defenses.
    pub fn new(defenses: Vec<Defense>) -> Self {
        Self { defenses }
    }

    /// Number of defenses.
    #[inline]
    pub fn len(&self) -> usize {
        self.defenses.len()
    }

    /// Whether the schedule holds no defenses.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.defenses.is_empty()
    }

    /// Whether every defense has a room and a start time.
    pub fn is_complete(&self) -> bool {
        !self.defenses.is_empty() && self.defenses.iter().all(Defense::is_placed)
    }

    /// Ids of defenses missing a room or start time.
    pub fn unplaced_ids(&self) -> Vec<String> {
        self.defenses
            .iter()
            .filter(|d| !d.is_placed())
            .map(|d| d.id.clone())
            .collect()
    }

    /// Finds a defense by id.
    pub fn defense(&self, id: &str) -> Option<&Defense> {
        self.defenses.iter().find(|d| d.id == id)
    }

    /// Defenses in which `person` holds any role.
    pub fn defenses_for_person(&self, person: &str) -> Vec<&Defense> {
        self.defenses
            .iter()
            .filter(|d| d.involved_persons().any(|p| p == person))
            .collect()
    }

    /// Defenses held in `room`.
    pub fn defenses_for_room(&self, room: &str) -> Vec<&Defense> {
        self.defenses
            .iter()
            .filter(|d| d.room_id() == Some(room))
            .collect()
    }

    /// Copy ordered by start time; unplaced defenses last.
    pub fn sorted_by_start(&self) -> Schedule {
        let mut defenses = self.defenses.clone();
        defenses.sort_by(|a, b| match (a.start, b.start) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        Schedule::new(defenses)
    }

    /// Consumes the schedule, returning its defenses.
    pub fn into_defenses(self) -> Vec<Defense> {
        self.defenses
    }
}

impl From<Vec<Defense>> for Schedule {
    fn from(defenses: Vec<Defense>) -> Self {
        Self::new(defenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 17)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn sample_schedule() -> Schedule {
        Schedule::new(vec![
            Defense::new("D1", "")
                .with_supervisor("A")
                .with_reviewer("B")
                .with_president("C")
                .with_room("101")
                .with_start(at(10)),
            Defense::new("D2", "")
                .with_supervisor("B")
                .with_reviewer("D")
                .with_president("E")
                .with_room("102")
                .with_start(at(8)),
            Defense::new("D3", "")
                .with_supervisor("A")
                .with_reviewer("D")
                .with_president("F"),
        ])
    }

    #[test]
    fn test_completeness() {
        let s = sample_schedule();
        assert!(!s.is_complete());
        assert_eq!(s.unplaced_ids(), vec!["D3".to_string()]);
        assert!(!Schedule::default().is_complete());
    }

    #[test]
    fn test_views() {
        let s = sample_schedule();
        assert_eq!(s.defenses_for_person("A").len(), 2);
        assert_eq!(s.defenses_for_person("B").len(), 2);
        assert_eq!(s.defenses_for_room("101").len(), 1);
        assert!(s.defense("D2").is_some());
        assert!(s.defense("D99").is_none());
    }

    #[test]
    fn test_sorted_by_start() {
        let sorted = sample_schedule().sorted_by_start();
        let ids: Vec<&str> = sorted.defenses.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["D2", "D1", "D3"]);
    }

    #[test]
    fn test_clone_is_deep() {
        let a = sample_schedule();
        let mut b = a.clone();
        b.defenses[0].room = Some("999".into());
        assert_eq!(a.defenses[0].room.as_deref(), Some("101"));
    }
}
