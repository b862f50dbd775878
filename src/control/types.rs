//! Records stored per run id.

use super::store::FieldMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status carried by a progress heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The solver is iterating.
    Running,
    /// The solver stopped iterating and is wrapping up.
    Completing,
    /// The solver stopped because of an abort request.
    Aborted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completing => write!(f, "completing"),
            RunStatus::Aborted => write!(f, "aborted"),
        }
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completing" => Ok(RunStatus::Completing),
            "aborted" => Ok(RunStatus::Aborted),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// Abort flag contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbortRecord {
    /// Why the abort was requested.
    pub reason: String,
    /// Who requested it.
    pub requested_by: String,
    /// When it was requested.
    pub requested_at: DateTime<Utc>,
}

/// Heartbeat written by a running solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// Current iteration.
    pub iteration: u64,
    /// Best score so far.
    pub best_score: f64,
    /// Number of assignments in the current best solution.
    pub assignments_count: u64,
    /// Number of constraint violations in the current best solution.
    pub violations_count: u64,
    /// Lifecycle status.
    pub status: RunStatus,
}

impl Default for ProgressUpdate {
    fn default() -> Self {
        Self {
            iteration: 0,
            best_score: 0.0,
            assignments_count: 0,
            violations_count: 0,
            status: RunStatus::Running,
        }
    }
}

/// A stored heartbeat, as read back.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    /// Run the heartbeat belongs to.
    pub run_id: String,
    /// Current iteration.
    pub iteration: u64,
    /// Best score so far.
    pub best_score: f64,
    /// Number of assignments in the current best solution.
    pub assignments_count: u64,
    /// Number of constraint violations in the current best solution.
    pub violations_count: u64,
    /// Lifecycle status.
    pub status: RunStatus,
    /// When the heartbeat was written.
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub(crate) const ITERATION: &'static str = "iteration";
    pub(crate) const BEST_SCORE: &'static str = "best_score";
    pub(crate) const ASSIGNMENTS_COUNT: &'static str = "assignments_count";
    pub(crate) const VIOLATIONS_COUNT: &'static str = "violations_count";
    pub(crate) const STATUS: &'static str = "status";
    pub(crate) const UPDATED_AT: &'static str = "updated_at";

    /// Field map for a heartbeat written at `updated_at`.
    ///
    /// Floats use Rust's shortest round-trip formatting, so reading the
    /// map back yields the same bits.
    pub(crate) fn to_fields(update: &ProgressUpdate, updated_at: DateTime<Utc>) -> FieldMap {
        [
            (Self::ITERATION, update.iteration.to_string()),
            (Self::BEST_SCORE, update.best_score.to_string()),
            (Self::ASSIGNMENTS_COUNT, update.assignments_count.to_string()),
            (Self::VIOLATIONS_COUNT, update.violations_count.to_string()),
            (Self::STATUS, update.status.to_string()),
            (Self::UPDATED_AT, updated_at.to_rfc3339()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// Parses a stored field map. `None` if any field is missing or malformed.
    pub(crate) fn from_fields(run_id: &str, fields: &FieldMap) -> Option<Self> {
        let field = |name: &str| fields.get(name).map(String::as_str);
        Some(Self {
            run_id: run_id.to_string(),
            iteration: field(Self::ITERATION)?.parse().ok()?,
            best_score: field(Self::BEST_SCORE)?.parse().ok()?,
            assignments_count: field(Self::ASSIGNMENTS_COUNT)?.parse().ok()?,
            violations_count: field(Self::VIOLATIONS_COUNT)?.parse().ok()?,
            status: field(Self::STATUS)?.parse().ok()?,
            updated_at: DateTime::parse_from_rfc3339(field(Self::UPDATED_AT)?)
                .ok()?
                .with_timezone(&Utc),
        })
    }

    /// The heartbeat without its metadata.
    pub fn update(&self) -> ProgressUpdate {
        ProgressUpdate {
            iteration: self.iteration,
            best_score: self.best_score,
            assignments_count: self.assignments_count,
            violations_count: self.violations_count,
            status: self.status,
        }
    }
}

/// Best-so-far result written when a run stops early.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialResult {
    /// Number of assignments in the result.
    pub assignments_count: u64,
    /// Score of the result.
    pub score: f64,
    /// Why the run stopped.
    pub reason: String,
}

/// A stored partial result, as read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialResultRecord {
    /// Number of assignments in the result.
    pub assignments_count: u64,
    /// Score of the result. Non-finite scores are kept as-is.
    #[serde(with = "crate::serde_float")]
    pub score: f64,
    /// Why the run stopped.
    pub reason: String,
    /// When the result was saved.
    pub saved_at: DateTime<Utc>,
    /// Always `true`.
    pub is_partial: bool,
}
