//! Per-generation population summary.

use super::fitness::{FitnessVector, NUM_OBJECTIVES};
use super::multi_objective::{hypervolume, pareto_front};
use super::types::Individual;
use serde::{Deserialize, Serialize};

/// Pairs examined exhaustively for diversity below this population size.
const EXACT_DIVERSITY_LIMIT: usize = 64;

/// Pair samples used for diversity on larger populations.
const DIVERSITY_SAMPLES: usize = 2_016;

/// Monte Carlo samples for the hypervolume estimate.
const HYPERVOLUME_SAMPLES: usize = 4_096;

/// Immutable snapshot of one generation.
///
/// Fitness statistics are over the default [`FitnessVector::weighted_sum`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Generation number.
    pub generation: usize,
    /// Number of individuals.
    pub population_size: usize,
    /// Highest weighted fitness.
    pub best_fitness: f64,
    /// Lowest weighted fitness.
    pub worst_fitness: f64,
    /// Mean weighted fitness.
    pub mean_fitness: f64,
    /// Population standard deviation of the weighted fitness.
    pub std_fitness: f64,
    /// Mean normalized pairwise Hamming distance of chromosomes, in `[0, 1]`.
    pub diversity: f64,
    /// Number of non-dominated individuals.
    pub pareto_front_size: usize,
    /// Hypervolume of the non-dominated set relative to the origin.
    pub hypervolume: f64,
    /// Relative improvement of `best_fitness` over the previous snapshot.
    pub convergence: f64,
}

impl PopulationStats {
    /// Summarizes `population` at `generation`.
    ///
    /// `previous` is the prior generation's snapshot, used for
    /// `convergence`; pass `None` for the first generation.
    pub fn from_population(
        population: &[Individual],
        generation: usize,
        previous: Option<&PopulationStats>,
    ) -> Self {
        let n = population.len();
        if n == 0 {
            return Self {
                generation,
                population_size: 0,
                best_fitness: 0.0,
                worst_fitness: 0.0,
                mean_fitness: 0.0,
                std_fitness: 0.0,
                diversity: 0.0,
                pareto_front_size: 0,
                hypervolume: 0.0,
                convergence: 0.0,
            };
        }

        let scores: Vec<f64> = population.iter().map(|i| i.fitness.weighted_sum(None)).collect();
        let best = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let worst = scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let mean = scores.iter().sum::<f64>() / n as f64;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;

        let front: Vec<FitnessVector> = pareto_front(population).iter().map(|i| i.fitness).collect();
        let hv = hypervolume(&front, &[0.0; NUM_OBJECTIVES], HYPERVOLUME_SAMPLES, generation as u64);

        let convergence = match previous {
            Some(prev) if prev.best_fitness.abs() > f64::EPSILON => {
                (best - prev.best_fitness) / prev.best_fitness.abs()
            }
            _ => 0.0,
        };

        Self {
            generation,
            population_size: n,
            best_fitness: best,
            worst_fitness: worst,
            mean_fitness: mean,
            std_fitness: variance.sqrt(),
            diversity: diversity(population),
            pareto_front_size: front.len(),
            hypervolume: hv,
            convergence,
        }
    }
}

/// Mean normalized Hamming distance over individual pairs.
///
/// Exhaustive for small populations; larger ones use a fixed stride over
/// the pair space so the value stays deterministic.
fn diversity(population: &[Individual]) -> f64 {
    let n = population.len();
    if n < 2 {
        return 0.0;
    }

    let pair_distance = |i: usize, j: usize| -> Option<f64> {
        population[i]
            .chromosome
            .similarity(&population[j].chromosome)
            .ok()
            .map(|s| 1.0 - s)
    };

    let (sum, count) = if n <= EXACT_DIVERSITY_LIMIT {
        (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .filter_map(|(i, j)| pair_distance(i, j))
            .fold((0.0, 0usize), |(s, c), d| (s + d, c + 1))
    } else {
        let total_pairs = n * (n - 1) / 2;
        let stride = (total_pairs / DIVERSITY_SAMPLES).max(1);
        (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .step_by(stride)
            .filter_map(|(i, j)| pair_distance(i, j))
            .fold((0.0, 0usize), |(s, c), d| (s + d, c + 1))
    };

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::Chromosome;

    fn individual(seed: u64, score: f64) -> Individual {
        let mut ind = Individual::new(Chromosome::create_random(3, 4, 2, 0.5, seed).unwrap(), 0, seed);
        ind.fitness = FitnessVector::from([score; 6]);
        ind
    }

    #[test]
    fn test_empty_population() {
        let stats = PopulationStats::from_population(&[], 3, None);
        assert_eq!(stats.generation, 3);
        assert_eq!(stats.population_size, 0);
    }

    #[test]
    fn test_basic_statistics() {
        let pop = vec![individual(1, 0.2), individual(2, 0.4), individual(3, 0.6)];
        let stats = PopulationStats::from_population(&pop, 0, None);
        assert_eq!(stats.population_size, 3);
        assert!((stats.best_fitness - 0.6).abs() < 1e-12);
        assert!((stats.worst_fitness - 0.2).abs() < 1e-12);
        assert!((stats.mean_fitness - 0.4).abs() < 1e-12);
        assert!(stats.std_fitness > 0.0);
        assert_eq!(stats.pareto_front_size, 1);
        assert_eq!(stats.convergence, 0.0);
    }

    #[test]
    fn test_identical_chromosomes_have_zero_diversity() {
        let mut a = individual(1, 0.5);
        let b = a.clone();
        a.id = 99;
        let stats = PopulationStats::from_population(&[a, b], 0, None);
        assert_eq!(stats.diversity, 0.0);
    }

    #[test]
    fn test_convergence_against_previous() {
        let first = PopulationStats::from_population(&[individual(1, 0.5)], 0, None);
        let second = PopulationStats::from_population(&[individual(1, 0.6)], 1, Some(&first));
        assert!((second.convergence - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_large_population_diversity_in_range() {
        let pop: Vec<Individual> = (0..100).map(|s| individual(s, 0.5)).collect();
        let stats = PopulationStats::from_population(&pop, 0, None);
        assert!(stats.diversity > 0.0 && stats.diversity <= 1.0);
    }
}
