//! Defense timetabling problem definition.
//!
//! Bridges domain models (defenses, rooms, calendars) to the genetic
//! runner: builds random individuals and scores them. Also implements
//! `u_metaheur::ga::GaProblem`, so the instance runs under that crate's
//! generic `GaRunner` as well.

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;
use u_metaheur::ga::GaProblem;

use super::individual::ScheduleIndividual;
use super::operators::{one_point_crossover, point_mutate};
use crate::analysis::{Analysis, ConflictCounts, ScheduleAnalyzer};
use crate::error::{AnalysisError, ConfigError};
use crate::models::{Defense, Schedule, TimeSlot, Unavailability};
use crate::slots::SlotPolicy;

/// Everything the genetic runner needs to know about one instance.
///
/// # Example
/// ```no_run
/// use u_defense::ga::{DefenseProblem, GaConfig, GaRunner};
/// use u_defense::models::{TimeSlot, Unavailability};
/// use u_defense::slots::SlotPolicy;
///
/// # fn demo(window: TimeSlot) -> Result<(), Box<dyn std::error::Error>> {
/// let defenses = vec![/* defenses with resolved roles */];
/// let problem = DefenseProblem::new(
///     defenses,
///     vec!["A101".into()],
///     window,
///     SlotPolicy::default(),
///     Unavailability::new(),
///     Unavailability::new(),
/// )?;
/// let result = GaRunner::run(&problem, &GaConfig::default())?;
/// println!("{:?}", result.analysis);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DefenseProblem {
    templates: Vec<Defense>,
    rooms: Vec<String>,
    window: TimeSlot,
    policy: SlotPolicy,
    analyzer: ScheduleAnalyzer,
    pin_presets: bool,
}

impl DefenseProblem {
    /// Creates a problem.
    ///
    /// Blank room names are dropped.
    ///
    /// # Errors
    /// Empty defense or room list, an invalid slot policy, or a defense
    /// without three distinct role holders.
    pub fn new(
        defenses: Vec<Defense>,
        rooms: Vec<String>,
        window: TimeSlot,
        policy: SlotPolicy,
        person_unavailability: Unavailability,
        room_unavailability: Unavailability,
    ) -> Result<Self, ConfigError> {
        if defenses.is_empty() {
            return Err(ConfigError::NoDefenses);
        }
        let rooms: Vec<String> = rooms
            .into_iter()
            .filter(|r| !r.trim().is_empty())
            .collect();
        if rooms.is_empty() {
            return Err(ConfigError::NoRooms);
        }
        policy.validate()?;
        if let Some(d) = defenses.iter().find(|d| !d.has_resolved_roles()) {
            return Err(ConfigError::UnresolvedRoles(d.id.clone()));
        }

        let analyzer = ScheduleAnalyzer::new(
            person_unavailability,
            room_unavailability,
            policy.duration(),
        );
        Ok(Self {
            templates: defenses,
            rooms,
            window,
            policy,
            analyzer,
            pin_presets: false,
        })
    }

    /// Keeps template rooms and starts fixed through mutation.
    ///
    /// Off by default: pre-set values only seed the initial population and
    /// may be moved to resolve conflicts.
    pub fn with_pinned_presets(mut self, pin: bool) -> Self {
        self.pin_presets = pin;
        self
    }

    pub fn pins_presets(&self) -> bool {
        self.pin_presets
    }

    pub fn templates(&self) -> &[Defense] {
        &self.templates
    }

    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    pub fn window(&self) -> &TimeSlot {
        &self.window
    }

    pub fn policy(&self) -> &SlotPolicy {
        &self.policy
    }

    pub fn analyzer(&self) -> &ScheduleAnalyzer {
        &self.analyzer
    }

    /// Whether mutation must leave the start at `idx` alone.
    #[inline]
    pub fn is_start_pinned(&self, idx: usize) -> bool {
        self.pin_presets && self.templates.get(idx).is_some_and(|d| d.start.is_some())
    }

    /// Whether mutation must leave the room at `idx` alone.
    #[inline]
    pub fn is_room_pinned(&self, idx: usize) -> bool {
        self.pin_presets
            && self
                .templates
                .get(idx)
                .is_some_and(|d| d.room_id().is_some())
    }

    /// Random allowed start inside the window.
    pub fn random_start<R: Rng + ?Sized>(&self, rng: &mut R) -> chrono::NaiveDateTime {
        self.policy.generate_start(&self.window, rng)
    }

    /// Uniformly drawn room.
    pub fn random_room<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        self.rooms.choose(rng).cloned()
    }

    /// Clones the templates and fills every missing room and start.
    pub fn random_schedule<R: Rng + ?Sized>(&self, rng: &mut R) -> Schedule {
        let defenses = self
            .templates
            .iter()
            .map(|template| {
                let mut d = template.clone();
                if d.room_id().is_none() {
                    d.room = self.random_room(rng);
                }
                if d.start.is_none() {
                    d.start = Some(self.random_start(rng));
                }
                d
            })
            .collect();
        Schedule::new(defenses)
    }

    /// `size` independent random individuals.
    pub fn initialize_population<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Vec<Schedule> {
        (0..size).map(|_| self.random_schedule(rng)).collect()
    }

    /// Fitness of an individual (higher is better).
    #[inline]
    pub fn fitness(&self, schedule: &Schedule) -> f64 {
        self.analyzer.fitness(&schedule.defenses)
    }

    /// Raw conflict counts of an individual.
    pub fn conflicts(&self, schedule: &Schedule) -> ConflictCounts {
        self.analyzer.conflicts(&schedule.defenses)
    }

    /// Analysis of an individual.
    pub fn analyze(&self, schedule: &Schedule) -> Result<Analysis, AnalysisError> {
        self.analyzer.analyze(schedule)
    }
}

impl GaProblem for DefenseProblem {
    type Individual = ScheduleIndividual;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> ScheduleIndividual {
        ScheduleIndividual::new(self.random_schedule(rng))
    }

    fn evaluate(&self, individual: &ScheduleIndividual) -> f64 {
        self.conflicts(&individual.schedule).penalty()
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &ScheduleIndividual,
        parent2: &ScheduleIndividual,
        rng: &mut R,
    ) -> Vec<ScheduleIndividual> {
        // The runner has already rolled the crossover rate.
        let (c1, c2) = one_point_crossover(&parent1.schedule, &parent2.schedule, 1.0, rng);
        vec![c1.into(), c2.into()]
    }

    fn mutate<R: Rng>(&self, individual: &mut ScheduleIndividual, rng: &mut R) {
        point_mutate(&mut individual.schedule, self, rng);
    }

    fn on_generation(&self, generation: usize, best: f64) {
        debug!(generation, best_penalty = best, "generation evolved");
    }
}
