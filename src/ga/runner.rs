//! NSGA-II evolutionary loop.
//!
//! [`Nsga2Runner`] orchestrates the complete process:
//! initialization → evaluation → ranking → selection → variation →
//! environmental selection → repeat.

use super::chromosome::Chromosome;
use super::config::{Crossover, Nsga2Config};
use super::operators::{block_crossover, reset_mutation, resident_crossover, swap_mutation, uniform_crossover};
use super::population::Population;
use super::stats::PopulationStats;
use super::types::{Individual, RosterProblem};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Result of an NSGA-II run.
#[derive(Debug, Clone)]
pub struct Nsga2Result {
    /// Non-dominated individuals of the final population, most preferred first.
    pub pareto_front: Vec<Individual>,

    /// Individual with the highest default weighted fitness.
    pub best: Individual,

    /// Total number of generations executed.
    pub generations: usize,

    /// Whether the run stopped on stagnation.
    pub stagnated: bool,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Whether the run stopped on the time limit.
    pub timed_out: bool,

    /// One snapshot per generation, initial population included.
    pub history: Vec<PopulationStats>,
}

/// Executes the NSGA-II loop.
///
/// # Usage
///
/// ```ignore
/// let problem = Clinic::new();
/// let config = Nsga2Config::fast().with_seed(42);
/// let result = Nsga2Runner::run(&problem, &config);
/// println!("front size: {}", result.pareto_front.len());
/// ```
pub struct Nsga2Runner;

impl Nsga2Runner {
    /// Runs NSGA-II.
    ///
    /// # Panics
    /// Panics if the configuration is invalid (call [`Nsga2Config::validate`]
    /// first to get a descriptive error).
    pub fn run<P: RosterProblem>(problem: &P, config: &Nsga2Config) -> Nsga2Result {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs NSGA-II with an optional cancellation flag.
    ///
    /// When the flag becomes `true` the run stops at the start of the next
    /// generation and returns the current front.
    pub fn run_with_cancel<P: RosterProblem>(
        problem: &P,
        config: &Nsga2Config,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Nsga2Result {
        config.validate().expect("invalid Nsga2Config");

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let started = Instant::now();

        // 1. Initialize and evaluate
        let mut population = Population::random(
            config.population_size,
            problem.n_residents(),
            problem.n_blocks(),
            problem.n_templates(),
            config.initial_density,
            seed,
        )
        .expect("initial_density is clamped to [0, 1]");
        population.evaluate(problem, config.parallel);
        population.rank();

        let mut history = Vec::with_capacity(config.max_generations + 1);
        let initial = population.stats(None);
        problem.on_generation(&initial);
        let mut best_score = initial.best_fitness;
        history.push(initial);

        let mut stagnation_counter = 0usize;
        let mut stagnated = false;
        let mut cancelled = false;
        let mut timed_out = false;

        // 2. Evolutionary loop
        for _ in 0..config.max_generations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            if let Some(limit) = config.time_limit_ms {
                if started.elapsed().as_millis() as u64 >= limit {
                    timed_out = true;
                    break;
                }
            }

            population.advance_generation();
            let offspring = breed(problem, config, population.individuals(), &mut rng);
            for child in offspring {
                population.spawn(child);
            }
            population.evaluate_offspring(problem, config.parallel);
            population.truncate_by_preference(config.population_size);

            let stats = population.stats(history.last());
            problem.on_generation(&stats);
            debug!(
                generation = stats.generation,
                best = stats.best_fitness,
                front = stats.pareto_front_size,
                "nsga2 generation complete"
            );

            let improvement = if best_score.abs() > f64::EPSILON {
                (stats.best_fitness - best_score) / best_score.abs()
            } else {
                stats.best_fitness - best_score
            };
            if stats.best_fitness > best_score && improvement >= config.convergence_threshold {
                stagnation_counter = 0;
            } else {
                stagnation_counter += 1;
            }
            best_score = best_score.max(stats.best_fitness);
            history.push(stats);

            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                stagnated = true;
                break;
            }
        }

        let pareto_front: Vec<Individual> = population
            .individuals()
            .iter()
            .filter(|ind| ind.rank == 0)
            .cloned()
            .collect();
        let best = population
            .best_weighted()
            .cloned()
            .expect("population_size >= 2 is validated");

        Nsga2Result {
            pareto_front,
            best,
            generations: history.len() - 1,
            stagnated,
            cancelled,
            timed_out,
            history,
        }
    }
}

/// Produces `population_size` offspring from the ranked parents.
fn breed<P: RosterProblem, R: Rng>(
    problem: &P,
    config: &Nsga2Config,
    parents: &[Individual],
    rng: &mut R,
) -> Vec<Chromosome> {
    let mut offspring = Vec::with_capacity(config.population_size);

    while offspring.len() < config.population_size {
        let p1 = &parents[config.selection.select(parents, rng)].chromosome;
        let p2 = &parents[config.selection.select(parents, rng)].chromosome;

        let (c1, c2) = if rng.random_range(0.0..1.0) < config.crossover_rate {
            let children = match config.crossover {
                Crossover::Uniform => uniform_crossover(p1, p2, rng),
                Crossover::Resident => resident_crossover(p1, p2, rng),
                Crossover::Block => block_crossover(p1, p2, rng),
            };
            children.expect("population members share one shape")
        } else {
            (p1.clone(), p2.clone())
        };

        for mut child in [c1, c2] {
            if offspring.len() >= config.population_size {
                break;
            }
            if rng.random_range(0.0..1.0) < config.mutation_rate {
                reset_mutation(&mut child, config.gene_mutation_rate, rng);
                swap_mutation(&mut child, rng);
            }
            problem.repair(&mut child);
            offspring.push(child);
        }
    }

    offspring
}

// ============================================================================
// Tests
// ============================================================================
