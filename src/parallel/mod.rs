//! Parallel solver orchestration.
//!
//! Runs N independent instances of a caller-supplied async solver as tokio
//! tasks and keeps the result with the lowest objective value.
//!
//! - [`ParallelSolver`] waits for every instance, each under its own
//!   timeout.
//! - [`AdaptiveParallelSolver`] checks finished instances at fixed
//!   checkpoints and can stop early, on deadline, or on operator abort.
//!
//! Instances never share mutable input: each receives its own
//! [`ProblemData`], optionally merged with a [`StrategyVariant`].
//! Cancellation is cooperative through [`InstanceContext::is_cancelled`],
//! backed by task abort at the next await point.
//!
//! # References
//!
//! - Crainic & Toulouse (2010), "Parallel Meta-heuristics", in *Handbook of
//!   Metaheuristics*

mod adaptive;
mod config;
mod runner;
mod strategy;
mod types;

pub use adaptive::AdaptiveParallelSolver;
pub use config::ParallelConfig;
pub use runner::{ParallelReport, ParallelSolver, StopReason};
pub use strategy::{diversified_variants, HEURISTICS, SEARCH_STRATEGIES, SEED_STRIDE};
pub use types::{InstanceContext, InstanceSolver, ProblemData, Solution, SolverResult, StrategyVariant};
