//! Pareto utilities over [`FitnessVector`]s.
//!
//! All objectives are **maximized**. These are the NSGA-II building blocks:
//!
//! - [`non_dominated_sort`]: Fast non-dominated sorting (Deb et al., 2002)
//! - [`crowding_distance`]: Crowding distance assignment for diversity preservation
//! - [`assign_rank_and_crowding`]: Writes both into a population in place
//! - [`hypervolume`]: Seeded Monte Carlo estimate of the dominated volume
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - Zitzler & Thiele (1999), "Multiobjective Evolutionary Algorithms: A Comparative
//!   Case Study and the Strength Pareto Approach"

use super::fitness::{FitnessVector, NUM_OBJECTIVES};
use super::types::Individual;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of non-dominated sorting.
///
/// Each element of `ranks` corresponds to the Pareto rank of the solution
/// at the same index. Rank 0 is the Pareto front (non-dominated solutions).
#[derive(Debug, Clone)]
pub struct NondominatedSortResult {
    /// Pareto rank for each solution (0 = front).
    pub ranks: Vec<usize>,

    /// Indices grouped by front: `fronts[0]` contains rank-0 indices, etc.
    pub fronts: Vec<Vec<usize>>,
}

/// Fast non-dominated sorting.
///
/// Assigns a Pareto rank to each fitness vector using
/// [`FitnessVector::dominates`] (maximization).
///
/// # Complexity
///
/// O(m * n²) where m = number of objectives, n = number of solutions
///
/// # Example
///
/// ```
/// use u_roster::ga::FitnessVector;
/// use u_roster::ga::multi_objective::non_dominated_sort;
///
/// let f = |a, b| FitnessVector::new(a, b, 0.0, 0.0, 0.0, 0.0);
/// let fitness = vec![f(0.9, 0.1), f(0.5, 0.5), f(0.1, 0.9), f(0.4, 0.4)];
///
/// let result = non_dominated_sort(&fitness);
/// assert_eq!(result.ranks, vec![0, 0, 0, 1]);
/// ```
pub fn non_dominated_sort(fitness: &[FitnessVector]) -> NondominatedSortResult {
    let n = fitness.len();
    if n == 0 {
        return NondominatedSortResult {
            ranks: Vec::new(),
            fronts: Vec::new(),
        };
    }

    let mut domination_count = vec![0usize; n];
    let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut ranks = vec![0usize; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if fitness[i].dominates(&fitness[j]) {
                dominates[i].push(j);
                domination_count[j] += 1;
            } else if fitness[j].dominates(&fitness[i]) {
                dominates[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let front_0: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();

    let mut fronts = vec![front_0];
    loop {
        let current = fronts.last().expect("fronts is initialized with front_0; never empty");
        let mut next_front = Vec::new();

        for &i in current {
            for &j in &dominates[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = fronts.len();
                    next_front.push(j);
                }
            }
        }

        if next_front.is_empty() {
            break;
        }
        fronts.push(next_front);
    }

    NondominatedSortResult { ranks, fronts }
}

/// Crowding distance for a set of fitness vectors (typically one front).
///
/// Boundary solutions (min/max for any objective) receive `f64::INFINITY`.
/// Objectives with zero range contribute nothing.
///
/// # Complexity
///
/// O(m * n * log n)
pub fn crowding_distance(fitness: &[FitnessVector]) -> Vec<f64> {
    let n = fitness.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let values: Vec<[f64; NUM_OBJECTIVES]> = fitness.iter().map(FitnessVector::to_array).collect();
    let mut distances = vec![0.0f64; n];

    for obj in 0..NUM_OBJECTIVES {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.sort_by(|&a, &b| {
            values[a][obj]
                .partial_cmp(&values[b][obj])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        distances[indices[0]] = f64::INFINITY;
        distances[indices[n - 1]] = f64::INFINITY;

        let range = values[indices[n - 1]][obj] - values[indices[0]][obj];
        if range > 0.0 {
            for i in 1..(n - 1) {
                let prev = values[indices[i - 1]][obj];
                let next = values[indices[i + 1]][obj];
                distances[indices[i]] += (next - prev) / range;
            }
        }
    }

    distances
}

/// Sorts `population` into fronts and writes `rank` and
/// `crowding_distance` into every individual.
///
/// Returns the fronts as index groups into `population`.
pub fn assign_rank_and_crowding(population: &mut [Individual]) -> Vec<Vec<usize>> {
    let fitness: Vec<FitnessVector> = population.iter().map(|ind| ind.fitness).collect();
    let sorted = non_dominated_sort(&fitness);

    for front in &sorted.fronts {
        let front_fitness: Vec<FitnessVector> = front.iter().map(|&i| fitness[i]).collect();
        let distances = crowding_distance(&front_fitness);
        for (&idx, distance) in front.iter().zip(distances) {
            population[idx].rank = sorted.ranks[idx];
            population[idx].crowding_distance = distance;
        }
    }

    sorted.fronts
}

/// Non-dominated members of `population`, by fitness alone.
///
/// Does not rely on previously assigned ranks.
pub fn pareto_front(population: &[Individual]) -> Vec<&Individual> {
    population
        .iter()
        .filter(|candidate| {
            !population
                .iter()
                .any(|other| other.fitness.dominates(&candidate.fitness))
        })
        .collect()
}

/// Seeded Monte Carlo estimate of the hypervolume dominated by `front`.
///
/// Points are sampled uniformly in the box between `reference` and the
/// unit point `[1.0; 6]`; the estimate is the box volume times the
/// fraction of samples weakly dominated by at least one front member.
/// Deterministic for a given `seed`.
pub fn hypervolume(
    front: &[FitnessVector],
    reference: &[f64; NUM_OBJECTIVES],
    samples: usize,
    seed: u64,
) -> f64 {
    if front.is_empty() || samples == 0 {
        return 0.0;
    }

    let box_volume: f64 = reference.iter().map(|r| (1.0 - r).max(0.0)).product();
    if box_volume == 0.0 {
        return 0.0;
    }

    let points: Vec<[f64; NUM_OBJECTIVES]> = front.iter().map(FitnessVector::to_array).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut hits = 0usize;
    let mut sample = [0.0f64; NUM_OBJECTIVES];

    for _ in 0..samples {
        for (s, r) in sample.iter_mut().zip(reference.iter()) {
            *s = r + rng.random::<f64>() * (1.0 - r);
        }
        if points
            .iter()
            .any(|p| p.iter().zip(sample.iter()).all(|(pv, sv)| pv >= sv))
        {
            hits += 1;
        }
    }

    box_volume * hits as f64 / samples as f64
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::Chromosome;

    fn f2(a: f64, b: f64) -> FitnessVector {
        FitnessVector::new(a, b, 0.0, 0.0, 0.0, 0.0)
    }

    // ---- Non-dominated sort ----

    #[test]
    fn test_empty() {
        let result = non_dominated_sort(&[]);
        assert!(result.ranks.is_empty());
        assert!(result.fronts.is_empty());
    }

    #[test]
    fn test_single_solution() {
        let result = non_dominated_sort(&[f2(0.5, 0.5)]);
        assert_eq!(result.ranks, vec![0]);
        assert_eq!(result.fronts, vec![vec![0]]);
    }

    #[test]
    fn test_clear_dominance() {
        let fit = vec![f2(0.9, 0.9), f2(0.5, 0.5), f2(0.1, 0.1)];
        let result = non_dominated_sort(&fit);
        assert_eq!(result.ranks, vec![0, 1, 2]);
        assert_eq!(result.fronts.len(), 3);
    }

    #[test]
    fn test_mixed_fronts() {
        let fit = vec![
            f2(0.9, 0.5), // front 0
            f2(0.7, 0.7), // front 0
            f2(0.5, 0.9), // front 0
            f2(0.6, 0.6), // dominated by [1]
            f2(0.4, 0.4), // dominated by [3]
        ];
        let result = non_dominated_sort(&fit);
        assert_eq!(result.ranks, vec![0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_all_equal() {
        let fit = vec![f2(0.3, 0.3); 3];
        let result = non_dominated_sort(&fit);
        assert!(result.ranks.iter().all(|&r| r == 0));
    }

    // ---- Crowding distance ----

    #[test]
    fn test_crowding_small_sets() {
        assert!(crowding_distance(&[f2(0.1, 0.2)])[0].is_infinite());
        assert!(crowding_distance(&[f2(0.1, 0.3), f2(0.3, 0.1)])
            .iter()
            .all(|d| d.is_infinite()));
    }

    #[test]
    fn test_crowding_evenly_spaced() {
        let fit = vec![
            f2(0.0, 0.4),
            f2(0.1, 0.3),
            f2(0.2, 0.2),
            f2(0.3, 0.1),
            f2(0.4, 0.0),
        ];
        let dist = crowding_distance(&fit);
        assert!(dist[0].is_infinite());
        assert!(dist[4].is_infinite());
        assert!((dist[1] - dist[2]).abs() < 1e-10);
        assert!((dist[2] - dist[3]).abs() < 1e-10);
    }

    #[test]
    fn test_crowding_zero_range_objective() {
        let fit = vec![f2(0.1, 0.5), f2(0.2, 0.5), f2(0.3, 0.5)];
        let dist = crowding_distance(&fit);
        assert!(dist[1].is_finite());
        assert!(dist[1] > 0.0);
    }

    // ---- Population helpers ----

    fn individual(id: u64, fitness: FitnessVector) -> Individual {
        let mut ind = Individual::new(Chromosome::new(1, 1, 1), 0, id);
        ind.fitness = fitness;
        ind
    }

    #[test]
    fn test_assign_rank_and_crowding() {
        let mut pop = vec![
            individual(0, f2(0.9, 0.1)),
            individual(1, f2(0.5, 0.5)),
            individual(2, f2(0.1, 0.9)),
            individual(3, f2(0.4, 0.4)),
        ];
        let fronts = assign_rank_and_crowding(&mut pop);
        assert_eq!(fronts.len(), 2);
        assert_eq!(pop[0].rank, 0);
        assert_eq!(pop[3].rank, 1);
        assert!(pop[0].crowding_distance.is_infinite());
        assert!(pop[1].crowding_distance.is_finite());
        assert!(pop[3].crowding_distance.is_infinite());
    }

    #[test]
    fn test_pareto_front() {
        let pop = vec![
            individual(0, f2(0.9, 0.1)),
            individual(1, f2(0.4, 0.4)),
            individual(2, f2(0.5, 0.5)),
        ];
        let front: Vec<u64> = pareto_front(&pop).iter().map(|i| i.id).collect();
        assert_eq!(front, vec![0, 2]);
    }

    // ---- Hypervolume ----

    #[test]
    fn test_hypervolume_full_point() {
        let front = [FitnessVector::from([1.0; 6])];
        let hv = hypervolume(&front, &[0.0; 6], 2_000, 1);
        assert!((hv - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hypervolume_empty() {
        assert_eq!(hypervolume(&[], &[0.0; 6], 100, 1), 0.0);
    }

    #[test]
    fn test_hypervolume_deterministic_and_monotone() {
        let small = [FitnessVector::from([0.8; 6])];
        let large = [FitnessVector::from([0.8; 6]), FitnessVector::from([0.9, 0.9, 0.9, 0.9, 0.9, 0.5])];
        let a = hypervolume(&small, &[0.5; 6], 5_000, 9);
        let b = hypervolume(&small, &[0.5; 6], 5_000, 9);
        let c = hypervolume(&large, &[0.5; 6], 5_000, 9);
        assert_eq!(a, b);
        assert!(c >= a);
        // exact value is (0.3/0.5)^6 of the box
        let exact = 0.5f64.powi(6) * (0.3f64 / 0.5).powi(6);
        assert!((a - exact).abs() < 0.01);
    }
}
