//! Genetic algorithm parameters.

use serde::{Deserialize, Serialize};
use u_metaheur::ga::Selection;

use super::operators::TOURNAMENT_SIZE;
use crate::error::ConfigError;

/// Parameters of one optimization run.
///
/// # Defaults
///
/// | Parameter | Value |
/// |-----------|-------|
/// | population_size | 150 |
/// | max_generations | 300 |
/// | crossover_rate | 0.85 |
/// | mutation_rate | 0.10 |
/// | elitism | 3 |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    pub population_size: usize,
    pub max_generations: usize,
    /// Probability that a parent pair is recombined.
    pub crossover_rate: f64,
    /// Per-gene probability of redrawing a time or a room.
    pub mutation_rate: f64,
    /// Best individuals copied unchanged into the next generation.
    pub elitism: usize,
    /// Fixed RNG seed; `None` seeds from the thread RNG.
    pub seed: Option<u64>,
    /// Evaluate fitness on the rayon pool.
    pub parallel: bool,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 150,
            max_generations: 300,
            crossover_rate: 0.85,
            mutation_rate: 0.10,
            elitism: 3,
            seed: None,
            parallel: false,
        }
    }
}

impl GaConfig {
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_elitism(mut self, elitism: usize) -> Self {
        self.elitism = elitism;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Rejects parameters the runner cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::ZeroPopulation);
        }
        if self.max_generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        for (name, value) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        if self.elitism >= self.population_size {
            return Err(ConfigError::ElitismTooLarge {
                elitism: self.elitism,
                population: self.population_size,
            });
        }
        Ok(())
    }

    /// Equivalent parameters for `u_metaheur::ga::GaRunner`.
    ///
    /// Elitism becomes an elite ratio that floors back to `elitism`, and
    /// stagnation stopping is disabled. That runner rolls `mutation_rate`
    /// once per child and then redraws a single gene.
    pub fn to_metaheur(&self) -> u_metaheur::ga::GaConfig {
        let elite_ratio = (self.elitism as f64 + 0.5) / self.population_size.max(1) as f64;
        let config = u_metaheur::ga::GaConfig::default()
            .with_population_size(self.population_size)
            .with_max_generations(self.max_generations)
            .with_selection(Selection::Tournament(TOURNAMENT_SIZE))
            .with_elite_ratio(elite_ratio)
            .with_crossover_rate(self.crossover_rate)
            .with_mutation_rate(self.mutation_rate)
            .with_stagnation_limit(0)
            .with_parallel(self.parallel);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}
