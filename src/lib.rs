//! Multi-objective rotation rostering engine.
//!
//! Assigns residents to rotation blocks under competing objectives and
//! supervises the long-running solves that produce those rosters.
//!
//! - **GA** ([`ga`]): chromosome grid encoding, six-objective fitness
//!   vectors, Pareto ranking, and an NSGA-II runner.
//! - **Parallel** ([`parallel`]): strategy-diversified solver instances
//!   run concurrently on tokio, with per-instance timeouts, early stop and
//!   best-of selection.
//! - **Incremental** ([`incremental`]): small in-place edits to an existing
//!   schedule with conflict accounting.
//! - **Control** ([`control`]): abort flags, progress heartbeats and
//!   partial results over a shared key-value store with expiring keys.
//! - **Context** ([`context`]): the startup-scoped owner of shared
//!   services.
//!
//! # Architecture
//!
//! The orchestration layer treats a solver as an opaque async function;
//! the evolutionary types are one backend that plugs into it. Run control
//! and incremental editing are usable by any backend. Failures in the
//! orchestration and control layers surface as result values and log
//! lines; representation errors surface immediately as [`RepresentationError`].

pub mod context;
pub mod control;
pub mod error;
pub mod ga;
pub mod incremental;
pub mod parallel;

mod serde_float;

pub use error::{RepresentationError, SolverError, StoreError, StoreResult};
