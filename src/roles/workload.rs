//! Per-person role workload statistics.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Role count | Defenses in which a person holds a given role |
//! | Total | Sum over the three roles |
//! | Imbalance | Sum over persons of `|sup - rev| + |sup - pres|` |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Defense, Role};

/// Role counts of one person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonLoad {
    pub supervisor: usize,
    pub reviewer: usize,
    pub president: usize,
}

impl PersonLoad {
    /// Count for `role`.
    #[inline]
    pub fn get(&self, role: Role) -> usize {
        match role {
            Role::Supervisor => self.supervisor,
            Role::Reviewer => self.reviewer,
            Role::President => self.president,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut usize {
        match role {
            Role::Supervisor => &mut self.supervisor,
            Role::Reviewer => &mut self.reviewer,
            Role::President => &mut self.president,
        }
    }

    /// Defenses across all roles.
    #[inline]
    pub fn total(&self) -> usize {
        self.supervisor + self.reviewer + self.president
    }
}

/// Workload per person, ordered by person id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadStats {
    loads: BTreeMap<String, PersonLoad>,
}

impl WorkloadStats {
    /// Counts role assignments over `defenses`.
    pub fn calculate<'a>(defenses: impl IntoIterator<Item = &'a Defense>) -> Self {
        let mut stats = Self::default();
        for d in defenses {
            for role in Role::ALL {
                if let Some(p) = d.role(role).filter(|p| !p.is_empty()) {
                    stats.record(p, role);
                }
            }
        }
        stats
    }

    /// Count of `person` in `role` (0 if unknown).
    pub fn count(&self, person: &str, role: Role) -> usize {
        self.loads.get(person).map_or(0, |l| l.get(role))
    }

    /// Load of `person`.
    pub fn load(&self, person: &str) -> PersonLoad {
        self.loads.get(person).copied().unwrap_or_default()
    }

    /// Records one more `role` for `person`.
    pub fn record(&mut self, person: &str, role: Role) {
        *self.loads.entry(person.to_string()).or_default().slot_mut(role) += 1;
    }

    /// Removes one `role` from `person` (saturating).
    pub fn release(&mut self, person: &str, role: Role) {
        if let Some(load) = self.loads.get_mut(person) {
            let slot = load.slot_mut(role);
            *slot = slot.saturating_sub(1);
        }
    }

    /// Persons and their loads, by id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PersonLoad)> {
        self.loads.iter().map(|(p, l)| (p.as_str(), l))
    }

    /// Number of persons with a recorded role.
    pub fn len(&self) -> usize {
        self.loads.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Largest count of `role` held by any single person.
    pub fn max_count(&self, role: Role) -> usize {
        self.loads.values().map(|l| l.get(role)).max().unwrap_or(0)
    }

    /// Total distance of each person from an even supervisor/reviewer/president split.
    pub fn imbalance(&self) -> usize {
        self.loads
            .values()
            .map(|l| l.supervisor.abs_diff(l.reviewer) + l.supervisor.abs_diff(l.president))
            .sum()
    }
}
