//! Per-run handle for solver loops.

use super::solver_control::SolverControl;
use super::types::{PartialResult, ProgressUpdate, RunStatus};

/// Binds a [`SolverControl`] to one run id.
///
/// Remembers the last heartbeat so [`finish`](Self::finish) and
/// [`abort`](Self::abort) can report the best-so-far state without the
/// caller repeating it.
#[derive(Debug, Clone)]
pub struct RunMonitor {
    control: SolverControl,
    run_id: String,
    last: ProgressUpdate,
}

impl RunMonitor {
    /// Creates a monitor for `run_id`.
    pub fn new(control: SolverControl, run_id: impl Into<String>) -> Self {
        Self {
            control,
            run_id: run_id.into(),
            last: ProgressUpdate::default(),
        }
    }

    /// The run id.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The last heartbeat sent.
    pub fn last_progress(&self) -> &ProgressUpdate {
        &self.last
    }

    /// Abort reason, if one was requested.
    pub async fn check_abort(&self) -> Option<String> {
        self.control.should_abort(&self.run_id).await
    }

    /// Writes a `running` heartbeat.
    pub async fn heartbeat(
        &mut self,
        iteration: u64,
        best_score: f64,
        assignments_count: u64,
        violations_count: u64,
    ) -> bool {
        self.last = ProgressUpdate {
            iteration,
            best_score,
            assignments_count,
            violations_count,
            status: RunStatus::Running,
        };
        self.control.update_progress(&self.run_id, &self.last).await
    }

    /// Marks the run as `completing` and lowers any abort flag.
    pub async fn finish(&mut self) -> bool {
        self.last.status = RunStatus::Completing;
        let written = self.control.update_progress(&self.run_id, &self.last).await;
        self.control.clear_abort(&self.run_id).await;
        written
    }

    /// Marks the run as `aborted` and saves the last heartbeat as its
    /// partial result.
    pub async fn abort(&mut self, reason: &str) -> bool {
        self.last.status = RunStatus::Aborted;
        let progress = self.control.update_progress(&self.run_id, &self.last).await;
        let saved = self
            .control
            .save_partial_result(
                &self.run_id,
                &PartialResult {
                    assignments_count: self.last.assignments_count,
                    score: self.last.best_score,
                    reason: reason.to_string(),
                },
            )
            .await;
        progress && saved
    }
}
