//! Incremental schedule editing.
//!
//! Targeted edits to an existing schedule (adding or removing a person,
//! swapping two assignments, tightening a rotation's capacity) without
//! re-running the optimizer. Rotation eligibility and swap feasibility are
//! pluggable through [`RotationEligibility`] and [`SwapFeasibility`].

mod predicates;
mod types;
mod updater;

pub use predicates::{AlwaysFeasible, CapacityAwareSwap, CapacityEligibility, RotationEligibility, SwapFeasibility};
pub use types::{Assignment, DateRange, Person, Schedule, UpdateConstraints, NEUTRAL_PRIORITY};
pub use updater::{IncrementalScheduleUpdater, SwapOutcome, UpdateStats};
