//! Defense model.
//!
//! A defense is one examination event: a student project presented before
//! three faculty members, each in a distinct role, in a room at a time.
//! Roles, room and start are optional until the balancer and the genetic
//! scheduler fill them in.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Faculty participation category in a defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Supervises the project (encadrant).
    Supervisor,
    /// Reviews the report (rapporteur).
    Reviewer,
    /// Chairs the jury.
    President,
}

impl Role {
    /// All roles, in fill order.
    pub const ALL: [Role; 3] = [Role::Supervisor, Role::Reviewer, Role::President];

    /// Position of this role in [`Role::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Role::Supervisor => 0,
            Role::Reviewer => 1,
            Role::President => 2,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Supervisor => "supervisor",
            Role::Reviewer => "reviewer",
            Role::President => "president",
        };
        f.write_str(name)
    }
}

/// One defense to be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defense {
    /// Opaque identifier (student or report).
    pub id: String,
    /// Project title.
    pub titre: String,
    /// Role holders, indexed by [`Role::index`].
    pub roles: [Option<String>; 3],
    /// Assigned room.
    pub room: Option<String>,
    /// Start of the defense; it occupies `[start, start + duration)`.
    pub start: Option<NaiveDateTime>,
}

impl Defense {
    /// Creates a defense with no roles, room or start.
    pub fn new(id: impl Into<String>, titre: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            titre: titre.into(),
            roles: [None, None, None],
            room: None,
            start: None,
        }
    }

    /// Sets the supervisor.
    pub fn with_supervisor(self, person: impl Into<String>) -> Self {
        self.with_role(Role::Supervisor, person)
    }

    /// Sets the reviewer.
    pub fn with_reviewer(self, person: impl Into<String>) -> Self {
        self.with_role(Role::Reviewer, person)
    }

    /// Sets the president.
    pub fn with_president(self, person: impl Into<String>) -> Self {
        self.with_role(Role::President, person)
    }

    /// Sets the holder of `role`.
    pub fn with_role(mut self, role: Role, person: impl Into<String>) -> Self {
        self.roles[role.index()] = Some(person.into());
        self
    }

    /// Sets the room.
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Sets the start time.
    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Holder of `role`, if set.
    #[inline]
    pub fn role(&self, role: Role) -> Option<&str> {
        self.roles[role.index()].as_deref()
    }

    /// Replaces the holder of `role`.
    pub fn set_role(&mut self, role: Role, person: impl Into<String>) {
        self.roles[role.index()] = Some(person.into());
    }

    /// Set role holders (supervisor, reviewer, president order, unset skipped).
    pub fn involved_persons(&self) -> impl Iterator<Item = &str> {
        self.roles
            .iter()
            .filter_map(|r| r.as_deref())
            .filter(|p| !p.is_empty())
    }

    /// Whether `person` holds a role on this defense other than `role`.
    pub fn holds_other_role(&self, person: &str, role: Role) -> bool {
        Role::ALL
            .iter()
            .filter(|&&r| r != role)
            .any(|&r| self.role(r) == Some(person))
    }

    /// Whether all three roles are set and pairwise distinct.
    pub fn has_resolved_roles(&self) -> bool {
        match (
            self.role(Role::Supervisor),
            self.role(Role::Reviewer),
            self.role(Role::President),
        ) {
            (Some(s), Some(r), Some(p)) => {
                !s.is_empty() && !r.is_empty() && !p.is_empty() && s != r && s != p && r != p
            }
            _ => false,
        }
    }

    /// Room, treating a blank name as unset.
    #[inline]
    pub fn room_id(&self) -> Option<&str> {
        self.room.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// Whether both a room and a start time are assigned.
    #[inline]
    pub fn is_placed(&self) -> bool {
        self.room_id().is_some() && self.start.is_some()
    }

    /// `[start, start + duration)` if a start is assigned.
    pub fn interval(&self, duration: TimeDelta) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.start.map(|s| (s, s + duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 17)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_builder_sets_roles() {
        let d = Defense::new("PFE001", "Systeme X")
            .with_supervisor("profA")
            .with_reviewer("profB")
            .with_president("profC");
        assert_eq!(d.role(Role::Supervisor), Some("profA"));
        assert_eq!(d.role(Role::Reviewer), Some("profB"));
        assert_eq!(d.role(Role::President), Some("profC"));
        assert!(d.has_resolved_roles());
        assert_eq!(d.involved_persons().count(), 3);
    }

    #[test]
    fn test_duplicate_roles_not_resolved() {
        let d = Defense::new("PFE001", "")
            .with_supervisor("profA")
            .with_reviewer("profA")
            .with_president("profC");
        assert!(!d.has_resolved_roles());

        let partial = Defense::new("PFE002", "").with_supervisor("profA");
        assert!(!partial.has_resolved_roles());
    }

    #[test]
    fn test_holds_other_role() {
        let d = Defense::new("PFE001", "")
            .with_supervisor("profA")
            .with_reviewer("profB");
        assert!(d.holds_other_role("profA", Role::Reviewer));
        assert!(!d.holds_other_role("profA", Role::Supervisor));
        assert!(!d.holds_other_role("profZ", Role::President));
    }

    #[test]
    fn test_blank_room_is_unset() {
        let d = Defense::new("PFE001", "").with_room("  ").with_start(at(8));
        assert!(d.room_id().is_none());
        assert!(!d.is_placed());

        let placed = Defense::new("PFE001", "").with_room("101").with_start(at(8));
        assert!(placed.is_placed());
        assert_eq!(placed.interval(TimeDelta::hours(1)), Some((at(8), at(9))));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Supervisor.to_string(), "supervisor");
        assert_eq!(Role::ALL.map(Role::index), [0, 1, 2]);
    }
}
