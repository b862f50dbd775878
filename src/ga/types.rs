//! Population member and fitness-evaluation contract.
//!
//! [`Individual`] is the scored unit the NSGA-II machinery ranks and
//! selects; [`FitnessEvaluator`] is the opaque objective function a
//! constraint backend plugs in.

use super::chromosome::Chromosome;
use super::fitness::FitnessVector;
use super::stats::PopulationStats;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A scored candidate roster in a population.
///
/// Carries its chromosome, fitness, and the selection bookkeeping written
/// by [`assign_rank_and_crowding`](super::multi_objective::assign_rank_and_crowding).
/// `Clone` deep-copies the chromosome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Assignment grid.
    pub chromosome: Chromosome,
    /// Objective scores (all maximized).
    pub fitness: FitnessVector,
    /// Generation in which this individual was created.
    pub generation: usize,
    /// Population-unique id.
    pub id: u64,
    /// Pareto rank; 0 is the non-dominated front.
    pub rank: usize,
    /// Crowding distance within its front; larger is more isolated.
    #[serde(with = "crate::serde_float")]
    pub crowding_distance: f64,
}

impl Individual {
    /// Wraps a chromosome with zero fitness and unranked bookkeeping.
    pub fn new(chromosome: Chromosome, generation: usize, id: u64) -> Self {
        Self {
            chromosome,
            fitness: FitnessVector::default(),
            generation,
            id,
            rank: usize::MAX,
            crowding_distance: 0.0,
        }
    }

    /// Crowded-comparison order.
    ///
    /// `Less` means `self` is preferred: lower rank wins, and within the
    /// same rank the larger crowding distance wins.
    ///
    /// ```
    /// use u_roster::ga::{Chromosome, Individual};
    ///
    /// let mut a = Individual::new(Chromosome::new(1, 1, 1), 0, 0);
    /// let mut b = Individual::new(Chromosome::new(1, 1, 1), 0, 1);
    /// a.rank = 0;
    /// b.rank = 1;
    /// assert!(a.is_preferred_over(&b));
    /// ```
    pub fn cmp_preference(&self, other: &Self) -> Ordering {
        self.rank.cmp(&other.rank).then_with(|| {
            other
                .crowding_distance
                .partial_cmp(&self.crowding_distance)
                .unwrap_or(Ordering::Equal)
        })
    }

    /// `true` when `self` sorts strictly before `other`.
    pub fn is_preferred_over(&self, other: &Self) -> bool {
        self.cmp_preference(other) == Ordering::Less
    }
}

/// Opaque objective function.
///
/// Implemented by the constraint / compliance backend. Must be
/// `Send + Sync`: populations evaluate with rayon when the `parallel`
/// feature is enabled.
pub trait FitnessEvaluator: Send + Sync {
    /// Scores one chromosome.
    fn evaluate(&self, chromosome: &Chromosome) -> FitnessVector;
}

impl<F> FitnessEvaluator for F
where
    F: Fn(&Chromosome) -> FitnessVector + Send + Sync,
{
    fn evaluate(&self, chromosome: &Chromosome) -> FitnessVector {
        self(chromosome)
    }
}

/// A rostering problem the NSGA-II runner can optimize.
///
/// Supplies the grid shape and scoring; the runner handles
/// initialization, variation, ranking, and survivor selection.
///
/// # Implementing
///
/// ```ignore
/// struct Clinic { residents: usize, blocks: usize, rotations: u32 }
///
/// impl FitnessEvaluator for Clinic {
///     fn evaluate(&self, c: &Chromosome) -> FitnessVector { score(c) }
/// }
///
/// impl RosterProblem for Clinic {
///     fn n_residents(&self) -> usize { self.residents }
///     fn n_blocks(&self) -> usize { self.blocks }
///     fn n_templates(&self) -> u32 { self.rotations }
/// }
/// ```
pub trait RosterProblem: FitnessEvaluator {
    /// Number of resident rows.
    fn n_residents(&self) -> usize;

    /// Number of block columns.
    fn n_blocks(&self) -> usize;

    /// Number of rotation templates.
    fn n_templates(&self) -> u32;

    /// Repairs an offspring in place before evaluation.
    ///
    /// The default implementation is a no-op.
    fn repair(&self, _chromosome: &mut Chromosome) {}

    /// Called at the end of each generation with its snapshot.
    ///
    /// The default implementation is a no-op.
    fn on_generation(&self, _stats: &PopulationStats) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ind(rank: usize, crowding: f64) -> Individual {
        let mut i = Individual::new(Chromosome::new(2, 2, 1), 0, 0);
        i.rank = rank;
        i.crowding_distance = crowding;
        i
    }

    #[test]
    fn test_preference_sort() {
        let mut pop = vec![ind(1, 0.5), ind(0, 0.3), ind(0, 0.7)];
        pop.sort_by(Individual::cmp_preference);
        assert_eq!((pop[0].rank, pop[0].crowding_distance), (0, 0.7));
        assert_eq!((pop[1].rank, pop[1].crowding_distance), (0, 0.3));
        assert_eq!(pop[2].rank, 1);
    }

    #[test]
    fn test_serde_keeps_boundary_crowding() {
        let mut boundary = ind(0, f64::INFINITY);
        boundary.fitness.coverage = 0.75;
        let json = serde_json::to_string(&boundary).unwrap();
        let back: Individual = serde_json::from_str(&json).unwrap();
        assert_eq!(back, boundary);
        assert_eq!(back.crowding_distance, f64::INFINITY);
    }

    #[test]
    fn test_serde_validates_chromosome() {
        let mut value = serde_json::to_value(ind(0, 1.0)).unwrap();
        value["chromosome"]["genes"] = serde_json::json!([0, 0, 0]);
        assert!(serde_json::from_value::<Individual>(value).is_err());
    }

    #[test]
    fn test_infinite_crowding_preferred() {
        let a = ind(0, f64::INFINITY);
        let b = ind(0, 10.0);
        assert!(a.is_preferred_over(&b));
        assert!(!b.is_preferred_over(&a));
    }

    #[test]
    fn test_equal_not_preferred() {
        let a = ind(2, 1.0);
        assert!(!a.is_preferred_over(&a.clone()));
    }

    #[test]
    fn test_clone_is_deep() {
        let original = ind(0, 1.0);
        let mut copy = original.clone();
        copy.chromosome.set_assignment(0, 0, 1).unwrap();
        copy.fitness.coverage = 1.0;
        assert_eq!(original.chromosome.count_assignments(), 0);
        assert_eq!(original.fitness.coverage, 0.0);
    }

    #[test]
    fn test_closure_evaluator() {
        let eval = |c: &Chromosome| {
            let mut f = FitnessVector::default();
            f.coverage = c.count_assignments() as f64 / c.total_cells() as f64;
            f
        };
        let c = Chromosome::create_random(2, 2, 1, 1.0, 0).unwrap();
        assert_eq!(eval.evaluate(&c).coverage, 1.0);
    }
}
