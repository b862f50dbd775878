//! Population container for NSGA-II style evolution.

use super::chromosome::Chromosome;
use super::multi_objective::{assign_rank_and_crowding, pareto_front};
use super::stats::PopulationStats;
use super::types::{FitnessEvaluator, Individual};
use crate::error::RepresentationError;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Owns the individuals of one evolutionary run.
///
/// Hands out population-unique ids and tracks the current generation.
/// Members are owned values; nothing is aliased between populations.
#[derive(Debug, Clone, Default)]
pub struct Population {
    individuals: Vec<Individual>,
    generation: usize,
    next_id: u64,
}

impl Population {
    /// Creates an empty population at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `size` random chromosomes.
    ///
    /// Individual `k` is seeded with `seed + k`, so the whole population is
    /// reproducible from `seed`.
    pub fn random(
        size: usize,
        n_residents: usize,
        n_blocks: usize,
        n_templates: u32,
        density: f64,
        seed: u64,
    ) -> Result<Self, RepresentationError> {
        let mut population = Self::new();
        for k in 0..size as u64 {
            let chromosome = Chromosome::create_random(
                n_residents,
                n_blocks,
                n_templates,
                density,
                seed.wrapping_add(k),
            )?;
            population.spawn(chromosome);
        }
        Ok(population)
    }

    /// Adds a chromosome as a new individual of the current generation.
    ///
    /// Returns the assigned id.
    pub fn spawn(&mut self, chromosome: Chromosome) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.individuals.push(Individual::new(chromosome, self.generation, id));
        id
    }

    /// Current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Advances the generation counter.
    pub fn advance_generation(&mut self) {
        self.generation += 1;
    }

    /// Number of individuals.
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Whether the population has no members.
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Members in insertion or sorted order.
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Evaluates every member with `evaluator`.
    ///
    /// Runs on the rayon pool when `parallel` is set and the feature is on.
    pub fn evaluate<E: FitnessEvaluator>(&mut self, evaluator: &E, parallel: bool) {
        evaluate_slice(&mut self.individuals, evaluator, parallel);
    }

    /// Evaluates only members created in the current generation.
    pub fn evaluate_offspring<E: FitnessEvaluator>(&mut self, evaluator: &E, parallel: bool) {
        let generation = self.generation;
        let start = self
            .individuals
            .iter()
            .position(|ind| ind.generation == generation)
            .unwrap_or(self.individuals.len());
        evaluate_slice(&mut self.individuals[start..], evaluator, parallel);
    }

    /// Assigns Pareto ranks and crowding distances, then sorts members by
    /// preference (best first).
    pub fn rank(&mut self) {
        assign_rank_and_crowding(&mut self.individuals);
        self.individuals.sort_by(Individual::cmp_preference);
    }

    /// NSGA-II environmental selection.
    ///
    /// Ranks the population and keeps the `size` most preferred members.
    pub fn truncate_by_preference(&mut self, size: usize) {
        self.rank();
        self.individuals.truncate(size);
        // crowding is relative to the surviving front members
        self.rank();
    }

    /// Non-dominated members by fitness.
    pub fn pareto_front(&self) -> Vec<&Individual> {
        pareto_front(&self.individuals)
    }

    /// Member with the highest default weighted fitness.
    pub fn best_weighted(&self) -> Option<&Individual> {
        self.individuals.iter().max_by(|a, b| {
            a.fitness
                .weighted_sum(None)
                .partial_cmp(&b.fitness.weighted_sum(None))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Snapshot of the current generation.
    pub fn stats(&self, previous: Option<&PopulationStats>) -> PopulationStats {
        PopulationStats::from_population(&self.individuals, self.generation, previous)
    }
}

fn evaluate_slice<E: FitnessEvaluator>(individuals: &mut [Individual], evaluator: &E, parallel: bool) {
    if parallel {
        evaluate_parallel(individuals, evaluator);
    } else {
        for ind in individuals.iter_mut() {
            ind.fitness = evaluator.evaluate(&ind.chromosome);
        }
    }
}

#[cfg(feature = "parallel")]
fn evaluate_parallel<E: FitnessEvaluator>(individuals: &mut [Individual], evaluator: &E) {
    individuals.par_iter_mut().for_each(|ind| {
        ind.fitness = evaluator.evaluate(&ind.chromosome);
    });
}

#[cfg(not(feature = "parallel"))]
fn evaluate_parallel<E: FitnessEvaluator>(individuals: &mut [Individual], evaluator: &E) {
    for ind in individuals.iter_mut() {
        ind.fitness = evaluator.evaluate(&ind.chromosome);
    }
}
