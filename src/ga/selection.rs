//! Parent selection for NSGA-II.
//!
//! Selection works on the crowded-comparison order
//! ([`Individual::cmp_preference`]): lower Pareto rank first, larger
//! crowding distance breaking ties.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective GA: NSGA-II", §III-B

use super::types::Individual;
use rand::Rng;

/// Selection strategy for choosing parents.
///
/// # Examples
///
/// ```
/// use u_roster::ga::Selection;
///
/// // Binary crowded tournament (the NSGA-II default)
/// let sel = Selection::CrowdedTournament(2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Pick `k` individuals at random, keep the most preferred.
    ///
    /// Requires ranks and crowding distances to be assigned.
    CrowdedTournament(usize),

    /// Uniform random choice; no selection pressure.
    Random,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::CrowdedTournament(2)
    }
}

impl Selection {
    /// Select a parent index from the population.
    ///
    /// # Panics
    /// Panics if `population` is empty.
    pub fn select<R: Rng>(&self, population: &[Individual], rng: &mut R) -> usize {
        assert!(
            !population.is_empty(),
            "cannot select from empty population"
        );

        match self {
            Selection::CrowdedTournament(k) => crowded_tournament(population, *k, rng),
            Selection::Random => rng.random_range(0..population.len()),
        }
    }
}

fn crowded_tournament<R: Rng>(population: &[Individual], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if population[idx].is_preferred_over(&population[best_idx]) {
            best_idx = idx;
        }
    }
    best_idx
}
