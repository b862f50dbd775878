//! Cooperative run control over a shared key-value store.
//!
//! Three independent records per run id:
//!
//! | Record | Key | Lifetime |
//! |---|---|---|
//! | abort flag | `solver:abort:{run_id}` | 1 h |
//! | progress heartbeat | `solver:progress:{run_id}` | 2 h, refreshed per write |
//! | partial result | `solver:result:{run_id}` | 24 h |
//!
//! Operators raise the abort flag; solvers poll it and heartbeat their
//! progress. Nothing is locked, the last write wins and expiry cleans up
//! runs nobody tears down.

mod config;
mod monitor;
mod solver_control;
mod store;
mod types;

pub use config::ControlConfig;
pub use monitor::RunMonitor;
pub use solver_control::SolverControl;
pub use store::{FieldMap, KeyValueStore, MemoryStore};
pub use types::{AbortRecord, PartialResult, PartialResultRecord, ProgressRecord, ProgressUpdate, RunStatus};
