//! Generational loop.
//!
//! # Algorithm
//! 1. Build `population_size` random individuals.
//! 2. Per generation: score everyone, copy the `elitism` best unchanged,
//!    fill the rest with tournament-selected, crossed and mutated children
//!    (an odd leftover child is dropped).
//! 3. Return the fittest individual of the final population.
//!
//! Each generation is a pure `population -> population` step
//! ([`GaRunner::evolve_generation`]); all randomness comes from one
//! generator per run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::GaConfig;
use super::operators::{mutate, one_point_crossover, tournament_select};
use super::problem::DefenseProblem;
use crate::analysis::Analysis;
use crate::error::{ConfigError, PlanError};
use crate::models::Schedule;

/// Generations between progress log lines.
const LOG_INTERVAL: usize = 20;

/// Cooperative stop signal, checked between generations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Best individual of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// 1-based generation number.
    pub generation: usize,
    pub best_fitness: f64,
    pub room_conflicts: usize,
    pub teacher_conflicts: usize,
    pub unavailability_conflicts: usize,
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best schedule of the final population.
    pub schedule: Schedule,
    pub analysis: Analysis,
    /// Generations actually evolved.
    pub generations_run: usize,
    /// One entry per evolved generation.
    pub history: Vec<GenerationStats>,
    /// Stopped early by a [`CancellationToken`].
    pub cancelled: bool,
}

/// Genetic algorithm driver.
pub struct GaRunner;

impl GaRunner {
    /// Runs to completion with a generator seeded from `config.seed`.
    pub fn run(problem: &DefenseProblem, config: &GaConfig) -> Result<OptimizationResult, PlanError> {
        Self::run_with_cancel(problem, config, &CancellationToken::new())
    }

    /// Like [`GaRunner::run`], stopping early once `cancel` fires.
    pub fn run_with_cancel(
        problem: &DefenseProblem,
        config: &GaConfig,
        cancel: &CancellationToken,
    ) -> Result<OptimizationResult, PlanError> {
        let mut rng = seeded_rng(config.seed);
        Self::run_with_rng(problem, config, cancel, &mut rng)
    }

    /// Runs with a caller-supplied generator.
    ///
    /// # Errors
    /// - [`PlanError::Config`] if `config` is invalid.
    /// - [`PlanError::EmptyPopulation`] if no individual could be built.
    /// - [`PlanError::Analysis`] if the best schedule cannot be analyzed.
    pub fn run_with_rng<R: Rng + ?Sized>(
        problem: &DefenseProblem,
        config: &GaConfig,
        cancel: &CancellationToken,
        rng: &mut R,
    ) -> Result<OptimizationResult, PlanError> {
        config.validate()?;

        let mut population = problem.initialize_population(config.population_size, rng);
        if population.is_empty() {
            return Err(PlanError::EmptyPopulation);
        }

        info!(
            defenses = problem.templates().len(),
            rooms = problem.rooms().len(),
            population = config.population_size,
            generations = config.max_generations,
            "starting defense scheduling"
        );

        let mut history = Vec::with_capacity(config.max_generations);
        let mut cancelled = false;

        for generation in 1..=config.max_generations {
            if cancel.is_cancelled() {
                warn!(generation, "optimization cancelled");
                cancelled = true;
                break;
            }

            population = Self::evolve_generation(problem, config, population, rng)?;
            if population.is_empty() {
                return Err(PlanError::EmptyPopulation);
            }

            let fitness = evaluate_all(problem, &population, config.parallel);
            let best = best_index(&fitness);
            let counts = problem.conflicts(&population[best]);
            let stats = GenerationStats {
                generation,
                best_fitness: fitness[best],
                room_conflicts: counts.room_conflicts,
                teacher_conflicts: counts.teacher_conflicts,
                unavailability_conflicts: counts.unavailability_conflicts,
            };

            debug!(
                generation,
                best_fitness = stats.best_fitness,
                room = stats.room_conflicts,
                teacher = stats.teacher_conflicts,
                unavailability = stats.unavailability_conflicts,
                "generation evolved"
            );
            if generation % LOG_INTERVAL == 0 || generation == config.max_generations {
                info!(
                    generation,
                    best_fitness = stats.best_fitness,
                    room = stats.room_conflicts,
                    teacher = stats.teacher_conflicts,
                    unavailability = stats.unavailability_conflicts,
                    "progress"
                );
            }
            history.push(stats);
        }

        let fitness = evaluate_all(problem, &population, config.parallel);
        let best = best_index(&fitness);
        let schedule = population.swap_remove(best);
        let analysis = problem.analyze(&schedule)?;

        info!(
            generations = history.len(),
            fitness = analysis.fitness,
            hard_conflicts = analysis.hard_conflicts(),
            idle_hours = analysis.idle_time_hours,
            cancelled,
            "defense scheduling finished"
        );

        Ok(OptimizationResult {
            schedule,
            analysis,
            generations_run: history.len(),
            history,
            cancelled,
        })
    }

    /// One generation: elites, then selected, crossed and mutated children.
    ///
    /// Returns `config.population_size` individuals, or an empty vector for
    /// an empty input.
    ///
    /// # Errors
    /// [`ConfigError`] if `config` is invalid; the population is dropped.
    pub fn evolve_generation<R: Rng + ?Sized>(
        problem: &DefenseProblem,
        config: &GaConfig,
        population: Vec<Schedule>,
        rng: &mut R,
    ) -> Result<Vec<Schedule>, ConfigError> {
        config.validate()?;
        let target = config.population_size;
        let fitness = evaluate_all(problem, &population, config.parallel);

        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));

        let mut next: Vec<Schedule> = ranked
            .iter()
            .take(config.elitism.min(target))
            .map(|&i| population[i].clone())
            .collect();

        let score = |s: &Schedule| problem.fitness(s);
        while next.len() < target {
            let (Some(a), Some(b)) = (
                tournament_select(&population, score, rng),
                tournament_select(&population, score, rng),
            ) else {
                break;
            };

            let (mut c1, mut c2) = one_point_crossover(a, b, config.crossover_rate, rng);
            mutate(&mut c1, problem, config.mutation_rate, rng);
            mutate(&mut c2, problem, config.mutation_rate, rng);

            next.push(c1);
            if next.len() < target {
                next.push(c2);
            }
        }
        Ok(next)
    }
}

/// Generator for one run: fixed by `seed`, else drawn from the thread RNG.
pub(crate) fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_rng(&mut rand::rng()),
    }
}

fn evaluate_all(problem: &DefenseProblem, population: &[Schedule], parallel: bool) -> Vec<f64> {
    if parallel {
        population.par_iter().map(|s| problem.fitness(s)).collect()
    } else {
        population.iter().map(|s| problem.fitness(s)).collect()
    }
}

/// Index of the highest fitness; the first one on ties.
fn best_index(fitness: &[f64]) -> usize {
    let mut best = 0;
    for (i, f) in fitness.iter().enumerate().skip(1) {
        if *f > fitness[best] {
            best = i;
        }
    }
    best
}
