//! Input validation for defense planning.
//!
//! Checks structural integrity of defenses, rooms and persons before
//! any role or slot work. Detects:
//! - Duplicate defense, room or person IDs
//! - Pre-set rooms or role holders missing from their catalog
//! - One person holding two roles on the same defense
//! - Pre-set starts off the allowed hours or outside the window

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Defense, Role, TimeSlot};
use crate::slots::SlotPolicy;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A defense has a blank ID.
    EmptyId,
    /// A pre-set room is not in the room list.
    UnknownRoom,
    /// A pre-set role holder is not an eligible person.
    UnknownPerson,
    /// One person holds two roles on the same defense.
    DuplicateRoleHolder,
    /// A pre-set start is not on an allowed hour or day.
    DisallowedStart,
    /// A pre-set defense does not fit inside the planning window.
    OutsideWindow,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates planning input.
///
/// Checks:
/// 1. No blank or duplicate defense IDs
/// 2. No duplicate room or person IDs
/// 3. Pre-set rooms exist
/// 4. Pre-set role holders are eligible persons
/// 5. No person holds two roles on one defense
/// 6. Pre-set starts are allowed starts and `[start, start + duration)`
///    lies inside `window`
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    defenses: &[Defense],
    rooms: &[String],
    persons: &[String],
    window: &TimeSlot,
    policy: &SlotPolicy,
) -> ValidationResult {
    let mut errors = Vec::new();

    let room_ids = collect_unique(rooms, "room", &mut errors);
    let person_ids = collect_unique(persons, "person", &mut errors);

    let mut defense_ids = HashSet::new();
    for d in defenses {
        if d.id.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyId,
                format!("Defense '{}' has a blank ID", d.titre),
            ));
        } else if !defense_ids.insert(d.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate defense ID: {}", d.id),
            ));
        }

        if let Some(room) = d.room_id() {
            if !room_ids.contains(room) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownRoom,
                    format!("Defense '{}' references unknown room '{}'", d.id, room),
                ));
            }
        }

        check_roles(d, &person_ids, &mut errors);

        if let Some(start) = d.start {
            if !policy.is_allowed_start(start) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DisallowedStart,
                    format!("Defense '{}' starts at {start}, which is not an allowed start", d.id),
                ));
            }
            if !policy.fits(window, start) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OutsideWindow,
                    format!(
                        "Defense '{}' at {start} ({} min) does not fit in [{}, {})",
                        d.id,
                        policy.duration_minutes,
                        window.start(),
                        window.end()
                    ),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_unique<'a>(
    ids: &'a [String],
    what: &str,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {what} ID: {id}"),
            ));
        }
    }
    seen
}

fn check_roles(d: &Defense, persons: &HashSet<&str>, errors: &mut Vec<ValidationError>) {
    for role in Role::ALL {
        let Some(person) = d.role(role).filter(|p| !p.is_empty()) else {
            continue;
        };
        if !persons.contains(person) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownPerson,
                format!("Defense '{}' has unknown {role} '{person}'", d.id),
            ));
        }
        // Report each clash once, from the later role.
        let clash = Role::ALL[..role.index()]
            .iter()
            .find(|&&earlier| d.role(earlier) == Some(person));
        if let Some(earlier) = clash {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateRoleHolder,
                format!(
                    "Defense '{}': '{person}' is both {earlier} and {role}",
                    d.id
                ),
            ));
        }
    }
}
