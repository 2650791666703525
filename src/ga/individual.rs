//! Schedule wrapper for generic GA runners.
//!
//! `u-metaheur` minimizes and stores the score on the individual, so the
//! wrapper carries the schedule's penalty (`1 + 10000 * hard + idle_hours`)
//! rather than its fitness.

use u_metaheur::ga::Individual;

use crate::models::Schedule;

/// A [`Schedule`] with its cached penalty.
///
/// Lower penalty = better schedule (minimization convention).
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleIndividual {
    pub schedule: Schedule,
    /// Penalty; `f64::INFINITY` until evaluated.
    pub penalty: f64,
}

impl ScheduleIndividual {
    /// Wraps an unevaluated schedule.
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            penalty: f64::INFINITY,
        }
    }

    pub fn into_schedule(self) -> Schedule {
        self.schedule
    }
}

impl Individual for ScheduleIndividual {
    type Fitness = f64;

    fn fitness(&self) -> f64 {
        self.penalty
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.penalty = fitness;
    }
}

impl From<Schedule> for ScheduleIndividual {
    fn from(schedule: Schedule) -> Self {
        Self::new(schedule)
    }
}
