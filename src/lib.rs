//! Academic defense timetabling.
//!
//! Assigns three distinct jury members (supervisor, reviewer, president),
//! a room and a start time to every student project defense, avoiding
//! overlaps and unavailability and keeping faculty idle time low.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Defense`, `Role`, `TimeSlot`,
//!   `Unavailability`, `Schedule`
//! - **`slots`**: Allowed start hours and random start generation
//! - **`validation`**: Input integrity checks (duplicate IDs, unknown
//!   rooms or persons, illegal pre-set starts)
//! - **`roles`**: Jury composition under per-role caps, workload stats
//! - **`analysis`**: Conflict counting, idle time, fitness
//! - **`ga`**: Genetic room/time assignment, also exposed as a
//!   `u-metaheur` `GaProblem`
//! - **`planner`**: The full pipeline in one call
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use u_defense::models::{Defense, TimeSlot};
//! use u_defense::planner::{plan, PlanningRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let day = NaiveDate::from_ymd_opt(2024, 6, 17).ok_or("bad date")?;
//! let window = TimeSlot::new(
//!     day.and_hms_opt(8, 0, 0).ok_or("bad time")?,
//!     day.and_hms_opt(18, 0, 0).ok_or("bad time")?,
//! )?;
//! let request = PlanningRequest::new(
//!     vec![Defense::new("PFE001", "Compiler"), Defense::new("PFE002", "Robot")],
//!     vec!["A101".into()],
//!     vec!["alice".into(), "bob".into(), "carol".into(), "dave".into()],
//!     window,
//! );
//! let outcome = plan(&request)?;
//! assert!(outcome.result.schedule.is_complete());
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - Holland (1975), "Adaptation in Natural and Artificial Systems"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

pub mod analysis;
pub mod error;
pub mod ga;
pub mod models;
pub mod planner;
pub mod roles;
pub mod slots;
pub mod validation;

pub use analysis::{Analysis, ScheduleAnalyzer};
pub use error::{AnalysisError, CapacityError, ConfigError, PlanError};
pub use planner::{plan, PlanningOutcome, PlanningRequest};
