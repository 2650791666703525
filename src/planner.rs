//! End-to-end defense planning.
//!
//! # Pipeline
//! 1. Parameter checks ([`GaConfig::validate`], [`SlotPolicy::validate`])
//! 2. Input integrity ([`validate_input`])
//! 3. Jury composition ([`RoleBalancer`])
//! 4. Room and time assignment ([`GaRunner`])
//!
//! Under [`FailurePolicy::Continue`](crate::roles::FailurePolicy::Continue)
//! defenses whose jury cannot be completed are left out of step 4 and
//! listed in [`PlanningOutcome::unscheduled`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigError, PlanError};
use crate::ga::{CancellationToken, DefenseProblem, GaConfig, GaRunner, OptimizationResult};
use crate::models::{Defense, TimeSlot, Unavailability};
use crate::roles::{BalanceConfig, BalanceReport, RoleBalancer};
use crate::slots::SlotPolicy;
use crate::validation::validate_input;

/// Everything needed to plan one defense session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningRequest {
    /// Defenses to plan; roles, room and start may be pre-set.
    pub defenses: Vec<Defense>,
    /// Available rooms.
    pub rooms: Vec<String>,
    /// Faculty eligible for jury seats.
    pub persons: Vec<String>,
    /// Planning period `[start, end)`.
    pub window: TimeSlot,
    #[serde(default)]
    pub person_unavailability: Unavailability,
    #[serde(default)]
    pub room_unavailability: Unavailability,
    #[serde(default)]
    pub slot_policy: SlotPolicy,
    #[serde(default)]
    pub balance: BalanceConfig,
    #[serde(default)]
    pub ga: GaConfig,
    /// Keep pre-set rooms and starts fixed during optimization.
    #[serde(default)]
    pub pin_presets: bool,
}

impl PlanningRequest {
    /// Creates a request with default policies and no unavailability.
    pub fn new(
        defenses: Vec<Defense>,
        rooms: Vec<String>,
        persons: Vec<String>,
        window: TimeSlot,
    ) -> Self {
        Self {
            defenses,
            rooms,
            persons,
            window,
            person_unavailability: Unavailability::new(),
            room_unavailability: Unavailability::new(),
            slot_policy: SlotPolicy::default(),
            balance: BalanceConfig::default(),
            ga: GaConfig::default(),
            pin_presets: false,
        }
    }

    /// Sets person unavailability.
    pub fn with_person_unavailability(mut self, unavailability: Unavailability) -> Self {
        self.person_unavailability = unavailability;
        self
    }

    /// Sets room unavailability.
    pub fn with_room_unavailability(mut self, unavailability: Unavailability) -> Self {
        self.room_unavailability = unavailability;
        self
    }

    /// Sets the slot policy.
    pub fn with_slot_policy(mut self, policy: SlotPolicy) -> Self {
        self.slot_policy = policy;
        self
    }

    /// Sets the role balancer settings.
    pub fn with_balance(mut self, balance: BalanceConfig) -> Self {
        self.balance = balance;
        self
    }

    /// Sets the GA parameters.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    /// Keeps pre-set rooms and starts out of mutation.
    pub fn with_pinned_presets(mut self, pin: bool) -> Self {
        self.pin_presets = pin;
        self
    }
}

/// Result of [`plan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningOutcome {
    /// Best schedule of the defenses that went through optimization.
    pub result: OptimizationResult,
    /// Jury composition report.
    pub balance: BalanceReport,
    /// Ids of defenses left out because their jury could not be completed.
    pub unscheduled: Vec<String>,
}

/// Plans a session with a generator seeded from `request.ga.seed`.
pub fn plan(request: &PlanningRequest) -> Result<PlanningOutcome, PlanError> {
    plan_with_cancel(request, &CancellationToken::new())
}

/// Like [`plan`], stopping the optimizer early once `cancel` fires.
pub fn plan_with_cancel(
    request: &PlanningRequest,
    cancel: &CancellationToken,
) -> Result<PlanningOutcome, PlanError> {
    let mut rng = crate::ga::seeded_rng(request.ga.seed);
    plan_with_rng(request, cancel, &mut rng)
}

/// Plans a session with a caller-supplied generator.
///
/// # Errors
/// - [`PlanError::Config`]: bad parameters or empty defense/room lists.
/// - [`PlanError::InvalidInput`]: every integrity issue found.
/// - [`PlanError::Capacity`]: a jury cannot be completed (abort policy),
///   or none can (continue policy).
/// - [`PlanError::EmptyPopulation`], [`PlanError::Analysis`]: from the optimizer.
pub fn plan_with_rng<R: Rng + ?Sized>(
    request: &PlanningRequest,
    cancel: &CancellationToken,
    rng: &mut R,
) -> Result<PlanningOutcome, PlanError> {
    request.ga.validate()?;
    request.slot_policy.validate()?;
    if request.defenses.is_empty() {
        return Err(ConfigError::NoDefenses.into());
    }
    if request.rooms.is_empty() {
        return Err(ConfigError::NoRooms.into());
    }
    validate_input(
        &request.defenses,
        &request.rooms,
        &request.persons,
        &request.window,
        &request.slot_policy,
    )
    .map_err(PlanError::InvalidInput)?;

    let balancer = RoleBalancer::new(request.persons.iter().cloned(), request.balance.clone());
    let balance = balancer.balance(&request.defenses, rng)?;

    let unscheduled = balance.failed_ids();
    if !unscheduled.is_empty() {
        warn!(count = unscheduled.len(), ids = ?unscheduled, "defenses left unscheduled");
    }
    let scheduled = balance.resolved();
    if scheduled.is_empty() {
        if let Some(first) = balance.failures.first() {
            return Err(first.clone().into());
        }
    }

    let problem = DefenseProblem::new(
        scheduled,
        request.rooms.clone(),
        request.window,
        request.slot_policy.clone(),
        request.person_unavailability.clone(),
        request.room_unavailability.clone(),
    )?
    .with_pinned_presets(request.pin_presets);
    let result = GaRunner::run_with_rng(&problem, &request.ga, cancel, rng)?;

    info!(
        scheduled = result.schedule.len(),
        unscheduled = unscheduled.len(),
        swaps = balance.swaps,
        feasible = result.analysis.is_feasible(),
        "planning complete"
    );

    Ok(PlanningOutcome {
        result,
        balance,
        unscheduled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::roles::FailurePolicy;
    use crate::validation::ValidationErrorKind;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn request(n: usize, persons: usize) -> PlanningRequest {
        PlanningRequest::new(
            (0..n)
                .map(|i| Defense::new(format!("PFE{:03}", i + 1), format!("Project {i}")))
                .collect(),
            vec!["A101".into(), "B202".into()],
            (0..persons).map(|p| format!("prof{p}")).collect(),
            TimeSlot::new(at(17, 8), at(19, 18)).unwrap(),
        )
        .with_ga(
            GaConfig::default()
                .with_population_size(30)
                .with_max_generations(30)
                .with_seed(42),
        )
    }

    #[test]
    fn test_plan_end_to_end() {
        let outcome = plan(&request(6, 6)).unwrap();
        let schedule = &outcome.result.schedule;

        assert_eq!(schedule.len(), 6);
        assert!(outcome.unscheduled.is_empty());
        for d in &schedule.defenses {
            assert!(d.has_resolved_roles());
            assert!(d.is_placed());
        }
        for role in Role::ALL {
            assert!(outcome.balance.workload.max_count(role) <= 5);
        }
    }

    #[test]
    fn test_plan_is_reproducible() {
        let a = plan(&request(4, 5)).unwrap();
        let b = plan(&request(4, 5)).unwrap();
        assert_eq!(a.result.schedule, b.result.schedule);
        assert_eq!(a.balance, b.balance);
    }

    #[test]
    fn test_invalid_input_reported() {
        let mut req = request(2, 4);
        req.defenses[1].id = "PFE001".into();
        match plan(&req) {
            Err(PlanError::InvalidInput(errors)) => {
                assert_eq!(errors[0].kind, ValidationErrorKind::DuplicateId);
            }
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let mut req = request(1, 3);
        req.rooms.clear();
        assert!(matches!(
            plan(&req),
            Err(PlanError::Config(ConfigError::NoRooms))
        ));

        let req = request(0, 3);
        assert!(matches!(
            plan(&req),
            Err(PlanError::Config(ConfigError::NoDefenses))
        ));
    }

    #[test]
    fn test_capacity_policies() {
        // Two persons can never fill three seats.
        let strict = request(2, 2);
        assert!(matches!(plan(&strict), Err(PlanError::Capacity(_))));

        // With a cap of one, three pre-set juries rotating the same three
        // persons use up every seat in every role, so PFE004 cannot get a
        // supervisor.
        let mut lenient = request(4, 3).with_balance(
            BalanceConfig::default()
                .with_max_per_role(1)
                .with_failure_policy(FailurePolicy::Continue),
        );
        for (i, d) in lenient.defenses.iter_mut().take(3).enumerate() {
            *d = d
                .clone()
                .with_supervisor(format!("prof{i}"))
                .with_reviewer(format!("prof{}", (i + 1) % 3))
                .with_president(format!("prof{}", (i + 2) % 3));
        }
        let outcome = plan(&lenient).unwrap();
        assert_eq!(outcome.unscheduled, vec!["PFE004".to_string()]);
        assert_eq!(outcome.balance.failures[0].role, Role::Supervisor);
        assert_eq!(outcome.balance.swaps, 0);
        let ids: Vec<&str> = outcome
            .result
            .schedule
            .defenses
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, ["PFE001", "PFE002", "PFE003"]);
    }
}
