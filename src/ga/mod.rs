//! GA-based room and time assignment.
//!
//! # Encoding
//!
//! An individual is a full [`Schedule`](crate::models::Schedule): the
//! defense templates with a room and a start filled in. Position `i`
//! always holds template `i`, so crossover exchanges whole defenses and
//! never duplicates or drops one.
//!
//! # Fitness
//!
//! `1 / (1 + 10000 * hard + idle_hours)`, shared with
//! [`ScheduleAnalyzer`](crate::analysis::ScheduleAnalyzer).
//!
//! # Runners
//!
//! [`GaRunner`] is the in-crate loop: integer elitism, per-gene mutation,
//! an injectable generator and cancellation. [`DefenseProblem`] also
//! implements `u_metaheur::ga::GaProblem` over [`ScheduleIndividual`], so
//! `u_metaheur::ga::GaRunner` can drive it with
//! [`GaConfig::to_metaheur`] parameters.
//!
//! # Submodules
//!
//! - [`operators`]: selection, crossover and mutation

mod config;
mod individual;
pub mod operators;
mod problem;
mod runner;

pub use config::GaConfig;
pub use individual::ScheduleIndividual;
pub use problem::DefenseProblem;
pub use runner::{CancellationToken, GaRunner, GenerationStats, OptimizationResult};
pub(crate) use runner::seeded_rng;
