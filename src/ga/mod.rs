//! Evolutionary representation and NSGA-II toolkit.
//!
//! The shared vocabulary of any evolutionary rostering backend: a dense
//! assignment grid, a six-objective fitness vector with Pareto semantics,
//! scored population members, and per-generation summaries. On top of that
//! sit the NSGA-II pieces needed to actually evolve a roster.
//!
//! # Core Types
//!
//! - [`Chromosome`]: `[residents][blocks]` grid of rotation ids (0 = unassigned)
//! - [`FitnessVector`]: six maximized objectives with [`dominates`](FitnessVector::dominates)
//! - [`Individual`]: chromosome + fitness + rank / crowding bookkeeping
//! - [`PopulationStats`]: immutable per-generation snapshot
//!
//! # Evolution
//!
//! - [`FitnessEvaluator`] / [`RosterProblem`]: the opaque objective function
//! - [`Population`]: id allocation, evaluation, ranking, survivor selection
//! - [`Nsga2Config`] / [`Nsga2Runner`]: the evolutionary loop
//!
//! # Submodules
//!
//! - [`multi_objective`]: non-dominated sorting, crowding distance, hypervolume
//! - [`operators`]: grid crossover and mutation operators
//! - [`export`]: JSON-safe front and history snapshots
//!
//! # References
//!
//! - Deb et al. (2002), *A Fast and Elitist Multiobjective GA: NSGA-II*
//! - Burke et al. (2004), *The State of the Art of Nurse Rostering*

mod chromosome;
mod config;
pub mod export;
mod fitness;
pub mod multi_objective;
pub mod operators;
mod population;
mod runner;
mod selection;
mod stats;
mod types;

pub use chromosome::{Chromosome, RotationId, UNASSIGNED};
pub use config::{Crossover, Nsga2Config};
pub use fitness::{FitnessVector, DEFAULT_WEIGHTS, NUM_OBJECTIVES, OBJECTIVE_NAMES};
pub use population::Population;
pub use runner::{Nsga2Result, Nsga2Runner};
pub use selection::Selection;
pub use stats::PopulationStats;
pub use types::{FitnessEvaluator, Individual, RosterProblem};
