//! NSGA-II configuration.
//!
//! [`Nsga2Config`] holds all parameters that control the evolutionary loop.

use super::selection::Selection;

/// Crossover operator used to produce offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Crossover {
    /// Cell-wise uniform crossover.
    #[default]
    Uniform,
    /// Whole resident rows exchanged.
    Resident,
    /// Single cut point over block columns.
    Block,
}

/// Configuration for the NSGA-II runner.
///
/// # Defaults
///
/// ```
/// use u_roster::ga::Nsga2Config;
///
/// let config = Nsga2Config::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_generations, 200);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_roster::ga::{Crossover, Nsga2Config};
///
/// let config = Nsga2Config::default()
///     .with_population_size(60)
///     .with_crossover(Crossover::Resident)
///     .with_mutation_rate(0.2)
///     .with_seed(7);
/// ```
#[derive(Debug, Clone)]
pub struct Nsga2Config {
    /// Number of individuals kept after each environmental selection.
    pub population_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Parent selection strategy.
    pub selection: Selection,

    /// Crossover operator.
    pub crossover: Crossover,

    /// Probability of applying crossover to a pair of parents (0.0–1.0).
    pub crossover_rate: f64,

    /// Probability of mutating an offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Per-cell re-draw probability when an offspring is mutated (0.0–1.0).
    pub gene_mutation_rate: f64,

    /// Fill density of the initial random population (0.0–1.0).
    pub initial_density: f64,

    /// Generations without best weighted-fitness improvement before stopping.
    ///
    /// Set to 0 to disable stagnation-based termination.
    pub stagnation_limit: usize,

    /// Minimum relative improvement that resets the stagnation counter.
    pub convergence_threshold: f64,

    /// Whether to evaluate offspring in parallel using rayon.
    pub parallel: bool,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,

    /// Optional wall-clock time limit in milliseconds.
    ///
    /// Checked at the start of each generation.
    pub time_limit_ms: Option<u64>,
}

impl Default for Nsga2Config {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 200,
            selection: Selection::default(),
            crossover: Crossover::default(),
            crossover_rate: 0.9,
            mutation_rate: 0.3,
            gene_mutation_rate: 0.02,
            initial_density: 0.8,
            stagnation_limit: 30,
            convergence_threshold: 0.0,
            parallel: true,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl Nsga2Config {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    /// Sets the crossover operator.
    pub fn with_crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the offspring mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the per-cell mutation rate.
    pub fn with_gene_mutation_rate(mut self, rate: f64) -> Self {
        self.gene_mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the initial fill density.
    pub fn with_initial_density(mut self, density: f64) -> Self {
        self.initial_density = density.clamp(0.0, 1.0);
        self
    }

    /// Sets the stagnation limit (0 to disable).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Sets the convergence threshold.
    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold.max(0.0);
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Preset for quick what-if runs.
    ///
    /// - Population: 40, Generations: 50, Time limit: 10s
    pub fn fast() -> Self {
        Self {
            population_size: 40,
            max_generations: 50,
            stagnation_limit: 15,
            convergence_threshold: 0.001,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset balancing quality and runtime.
    ///
    /// - Population: 100, Generations: 200, Time limit: 60s
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            max_generations: 200,
            stagnation_limit: 30,
            convergence_threshold: 0.001,
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Preset for overnight academic-year rosters.
    ///
    /// - Population: 200, Generations: 1000, Time limit: 10min
    pub fn quality() -> Self {
        Self {
            population_size: 200,
            max_generations: 1_000,
            stagnation_limit: 100,
            convergence_threshold: 0.0005,
            time_limit_ms: Some(600_000),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if let Selection::CrowdedTournament(0) = self.selection {
            return Err("tournament size must be at least 1".into());
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        Ok(())
    }
}
