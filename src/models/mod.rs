//! Defense timetabling domain models.
//!
//! # Domain Mappings
//!
//! | u-defense | Meaning |
//! |-----------|---------|
//! | Defense | One student project examination |
//! | Role | Supervisor, reviewer or president seat on the jury |
//! | TimeSlot | Half-open `[start, end)` interval |
//! | Unavailability | Blocked periods per person or room |
//! | Schedule | One candidate timetable (a GA individual) |

mod calendar;
mod defense;
mod schedule;

pub use calendar::{intervals_overlap, TimeSlot, Unavailability};
pub use defense::{Defense, Role};
pub use schedule::Schedule;
