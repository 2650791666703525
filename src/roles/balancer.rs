//! Jury role assignment and workload rebalancing.
//!
//! # Algorithm
//!
//! **Fill** (supervisor, then reviewer, then president): for each defense
//! missing the role, the pool is every eligible person who holds no other
//! role on that defense and is under the cap for this role. An empty pool
//! is a [`CapacityError`]; otherwise a pool member is drawn uniformly.
//!
//! **Rebalance** (reviewer, then president, each against supervisor): a
//! person with fewer role-B seats than supervisions is in deficit, one
//! with more is in excess, each listed `|sup - b|` times. One pass over
//! the defenses swaps an excess holder for the first deficit person who
//! may sit on that jury. Greedy, single pass, no backtracking: the
//! deficit is not guaranteed to reach zero.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::WorkloadStats;
use crate::error::CapacityError;
use crate::models::{Defense, Role};

/// What to do when a role cannot be filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole pass at the first unsatisfiable defense.
    #[default]
    Abort,
    /// Leave that defense as given, record the error, keep going.
    Continue,
}

/// Role balancer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Maximum defenses per person per role, counted over the whole list.
    pub max_per_role: usize,
    pub failure_policy: FailurePolicy,
    /// Run the rebalance phase after filling.
    pub rebalance: bool,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            max_per_role: 5,
            failure_policy: FailurePolicy::Abort,
            rebalance: true,
        }
    }
}

impl BalanceConfig {
    /// Sets the per-role cap.
    pub fn with_max_per_role(mut self, cap: usize) -> Self {
        self.max_per_role = cap;
        self
    }

    /// Sets the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enables or disables rebalancing.
    pub fn with_rebalance(mut self, rebalance: bool) -> Self {
        self.rebalance = rebalance;
        self
    }
}

/// Outcome of a balancing pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// All defenses, input order. Failed ones are returned as given.
    pub defenses: Vec<Defense>,
    /// Defenses whose roles could not be filled (continue policy only).
    pub failures: Vec<CapacityError>,
    /// Role swaps made by the rebalance phase.
    pub swaps: usize,
    /// Workload after filling, before rebalancing.
    pub fill_workload: WorkloadStats,
    /// Final workload of the successfully filled defenses.
    pub workload: WorkloadStats,
}

impl BalanceReport {
    /// Defenses with all three roles resolved.
    pub fn resolved(&self) -> Vec<Defense> {
        self.defenses
            .iter()
            .filter(|d| d.has_resolved_roles())
            .cloned()
            .collect()
    }

    /// Ids of defenses that failed.
    pub fn failed_ids(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.defense_id.clone()).collect()
    }
}

/// Assigns supervisor, reviewer and president seats.
#[derive(Debug, Clone)]
pub struct RoleBalancer {
    persons: Vec<String>,
    config: BalanceConfig,
}

impl RoleBalancer {
    /// Creates a balancer over `persons` (duplicates ignored, order kept).
    pub fn new<I, S>(persons: I, config: BalanceConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let persons = persons
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty() && seen.insert(p.clone()))
            .collect();
        Self { persons, config }
    }

    /// Eligible persons.
    pub fn persons(&self) -> &[String] {
        &self.persons
    }

    /// Settings.
    pub fn config(&self) -> &BalanceConfig {
        &self.config
    }

    /// Fills every missing role, then rebalances.
    ///
    /// The input is not modified.
    ///
    /// # Errors
    /// Under [`FailurePolicy::Abort`], the first defense whose pool is empty.
    pub fn balance<R: Rng + ?Sized>(
        &self,
        defenses: &[Defense],
        rng: &mut R,
    ) -> Result<BalanceReport, CapacityError> {
        let mut working = defenses.to_vec();
        let mut stats = WorkloadStats::calculate(&working);

        let failures = self.fill(&mut working, &mut stats, rng)?;

        let failed: HashSet<&str> = failures.iter().map(|f| f.defense_id.as_str()).collect();
        for (slot, original) in working.iter_mut().zip(defenses) {
            if failed.contains(original.id.as_str()) {
                *slot = original.clone();
            }
        }

        let mut stats =
            WorkloadStats::calculate(working.iter().filter(|d| !failed.contains(d.id.as_str())));
        let fill_workload = stats.clone();

        let swaps = if self.config.rebalance {
            let mut ok: Vec<&mut Defense> = working
                .iter_mut()
                .filter(|d| !failed.contains(d.id.as_str()))
                .collect();
            Role::ALL[1..]
                .iter()
                .map(|&role| self.rebalance_role(&mut ok, &mut stats, role))
                .sum::<usize>()
        } else {
            0
        };

        debug!(
            defenses = working.len(),
            failures = failures.len(),
            swaps,
            imbalance_before = fill_workload.imbalance(),
            imbalance_after = stats.imbalance(),
            "role balancing complete"
        );

        Ok(BalanceReport {
            defenses: working,
            failures,
            swaps,
            fill_workload,
            workload: stats,
        })
    }

    /// Fill phase. Returns the collected failures under the continue policy.
    fn fill<R: Rng + ?Sized>(
        &self,
        defenses: &mut [Defense],
        stats: &mut WorkloadStats,
        rng: &mut R,
    ) -> Result<Vec<CapacityError>, CapacityError> {
        let cap = self.config.max_per_role;
        let mut failures = Vec::new();
        let mut failed = vec![false; defenses.len()];

        for role in Role::ALL {
            for (idx, defense) in defenses.iter_mut().enumerate() {
                if failed[idx] || defense.role(role).is_some_and(|p| !p.is_empty()) {
                    continue;
                }

                let pool: Vec<&String> = self
                    .persons
                    .iter()
                    .filter(|p| !defense.holds_other_role(p, role) && stats.count(p, role) < cap)
                    .collect();

                let Some(&chosen) = pool.choose(rng) else {
                    let err = CapacityError {
                        defense_id: defense.id.clone(),
                        role,
                        cap,
                    };
                    match self.config.failure_policy {
                        FailurePolicy::Abort => return Err(err),
                        FailurePolicy::Continue => {
                            warn!(defense = %defense.id, %role, cap, "role left unassigned");
                            failed[idx] = true;
                            failures.push(err);
                            continue;
                        }
                    }
                };

                stats.record(chosen, role);
                defense.set_role(role, chosen.clone());
            }
        }

        Ok(failures)
    }

    /// One rebalance pass of `role` against supervision counts.
    fn rebalance_role(
        &self,
        defenses: &mut [&mut Defense],
        stats: &mut WorkloadStats,
        role: Role,
    ) -> usize {
        let cap = self.config.max_per_role;
        let mut deficit: Vec<String> = Vec::new();
        let mut excess: Vec<String> = Vec::new();

        for (person, load) in stats.iter() {
            let sup = load.get(Role::Supervisor);
            let held = load.get(role);
            let needed = sup.abs_diff(held);
            let list = if held < sup {
                &mut deficit
            } else if held > sup {
                &mut excess
            } else {
                continue;
            };
            list.extend(std::iter::repeat(person.to_string()).take(needed));
        }

        let mut swaps = 0;
        for defense in defenses.iter_mut() {
            if deficit.is_empty() {
                break;
            }
            let Some(holder) = defense.role(role).map(str::to_string) else {
                continue;
            };
            let Some(ex_pos) = excess.iter().position(|p| *p == holder) else {
                continue;
            };
            let Some(def_pos) = deficit.iter().position(|c| {
                *c != holder && !defense.holds_other_role(c, role) && stats.count(c, role) < cap
            }) else {
                continue;
            };

            let candidate = deficit.remove(def_pos);
            excess.remove(ex_pos);
            stats.release(&holder, role);
            stats.record(&candidate, role);
            debug!(defense = %defense.id, %role, from = %holder, to = %candidate, "rebalance swap");
            defense.set_role(role, candidate);
            swaps += 1;
        }
        swaps
    }
}
