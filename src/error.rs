//! Error taxonomy.
//!
//! - [`ConfigError`]: rejected before any population work begins.
//! - [`CapacityError`]: a role could not be filled under the per-role cap.
//! - [`AnalysisError`]: a schedule cannot be scored.
//! - [`PlanError`]: umbrella returned by the end-to-end planner.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Role;
use crate::validation::ValidationError;

/// Invalid optimizer input or parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("defense list cannot be empty")]
    NoDefenses,
    #[error("room list cannot be empty")]
    NoRooms,
    #[error("invalid time window: {0}")]
    InvalidWindow(String),
    #[error("population size must be positive")]
    ZeroPopulation,
    #[error("number of generations must be positive")]
    ZeroGenerations,
    #[error("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("elitism count {elitism} must be less than population size {population}")]
    ElitismTooLarge { elitism: usize, population: usize },
    #[error("defense '{0}' does not have three distinct roles assigned")]
    UnresolvedRoles(String),
    #[error("no allowed hours configured")]
    NoAllowedHours,
    #[error("allowed hour {0} is not a valid hour of day")]
    InvalidHour(u32),
    #[error("defense duration must be between 1 minute and 24 hours")]
    InvalidDuration,
}

/// A role that cannot be filled for a defense.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("no eligible {role} for defense '{defense_id}' under a cap of {cap}")]
pub struct CapacityError {
    pub defense_id: String,
    pub role: Role,
    pub cap: usize,
}

/// A schedule that cannot be analyzed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("invalid or empty schedule provided for analysis")]
    EmptySchedule,
    #[error("defenses missing a room or start time: {0:?}")]
    Malformed(Vec<String>),
}

/// Failure of an end-to-end planning run.
#[derive(Error, Debug, Clone)]
pub enum PlanError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("input validation failed with {} issue(s)", .0.len())]
    InvalidInput(Vec<ValidationError>),
    #[error("role assignment failed: {0}")]
    Capacity(#[from] CapacityError),
    #[error("population is empty")]
    EmptyPopulation,
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}
