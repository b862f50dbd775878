//! Strategy diversification catalogs.
//!
//! Instances explore different regions of the search space by varying the
//! seed, the construction heuristic and the search strategy.

use super::types::StrategyVariant;

/// Seed stride between instances: instance `i` uses seed `i * SEED_STRIDE`.
pub const SEED_STRIDE: u64 = 1000;

/// Construction heuristics, assigned round-robin.
pub const HEURISTICS: [&str; 4] = ["greedy", "random", "least_constrained", "most_constrained"];

/// Search strategies, assigned round-robin.
pub const SEARCH_STRATEGIES: [&str; 3] = ["automatic", "fixed", "portfolio"];

/// Builds one variant per instance.
///
/// ```
/// use u_roster::parallel::diversified_variants;
///
/// let variants = diversified_variants(5);
/// assert_eq!(variants[2].seed, Some(2000));
/// assert_eq!(variants[4].heuristic.as_deref(), Some("greedy"));
/// ```
pub fn diversified_variants(num_solvers: usize) -> Vec<StrategyVariant> {
    (0..num_solvers)
        .map(|solver_id| {
            StrategyVariant::new()
                .with_seed(solver_id as u64 * SEED_STRIDE)
                .with_heuristic(HEURISTICS[solver_id % HEURISTICS.len()])
                .with_search_strategy(SEARCH_STRATEGIES[solver_id % SEARCH_STRATEGIES.len()])
        })
        .collect()
}
