//! Checkpointed parallel solving with early stop and operator abort.

use super::config::ParallelConfig;
use super::runner::{Batch, ParallelReport, StopReason};
use super::types::{InstanceSolver, ProblemData, SolverResult, StrategyVariant};
use crate::control::{RunMonitor, SolverControl};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Parallel solver that inspects finished instances at fixed checkpoints.
///
/// At each checkpoint the best objective among completed instances is
/// compared with the configured
/// [`early_stop_threshold`](ParallelConfig::early_stop_threshold). Once it
/// is reached, or the overall timeout elapses, the remaining instances are
/// cancelled and excluded from selection.
///
/// When bound to a [`SolverControl`] run id, each checkpoint also writes a
/// progress heartbeat and honours an operator abort request.
#[derive(Debug, Clone)]
pub struct AdaptiveParallelSolver {
    config: ParallelConfig,
    control: Option<(SolverControl, String)>,
}

impl AdaptiveParallelSolver {
    /// Creates a solver.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn new(config: ParallelConfig) -> Self {
        config.validate().expect("invalid ParallelConfig");
        Self { config, control: None }
    }

    /// Binds the solver to a run id for heartbeats and abort requests.
    ///
    /// Heartbeats carry the checkpoint index as `iteration`, the best
    /// objective as `best_score`, and the counts of succeeded and failed
    /// instances as `assignments_count` and `violations_count`.
    pub fn with_abort_control(mut self, control: SolverControl, run_id: impl Into<String>) -> Self {
        self.control = Some((control, run_id.into()));
        self
    }

    /// The configuration.
    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Runs all instances and returns the best result.
    pub async fn solve_adaptive<S: InstanceSolver>(
        &self,
        problem: &ProblemData,
        solver: S,
        variants: Option<Vec<StrategyVariant>>,
    ) -> SolverResult {
        self.solve_adaptive_detailed(problem, solver, variants).await.best
    }

    /// Like [`solve_adaptive`](Self::solve_adaptive), also returning every
    /// collected result and the stop reason.
    pub async fn solve_adaptive_detailed<S: InstanceSolver>(
        &self,
        problem: &ProblemData,
        solver: S,
        variants: Option<Vec<StrategyVariant>>,
    ) -> ParallelReport {
        let started = Instant::now();
        let deadline = started + self.config.timeout;
        let mut batch = Batch::launch(&self.config, problem, Arc::new(solver), variants.as_deref());
        let mut monitor = self
            .control
            .as_ref()
            .map(|(control, run_id)| RunMonitor::new(control.clone(), run_id.clone()));

        let mut results: Vec<SolverResult> = Vec::with_capacity(self.config.num_solvers);
        let mut best_objective = f64::INFINITY;
        let mut checkpoint = 0u64;
        let mut stop_reason = StopReason::Completed;
        let mut abort_reason = None;

        while !batch.tasks.is_empty() {
            let until = (Instant::now() + self.config.checkpoint_interval).min(deadline);
            loop {
                match tokio::time::timeout_at(until, batch.tasks.join_next()).await {
                    Ok(Some(Ok(result))) => results.push(result),
                    Ok(Some(Err(err))) => warn!(error = %err, "solver supervisor task failed"),
                    Ok(None) | Err(_) => break,
                }
            }
            checkpoint += 1;

            let current = results
                .iter()
                .filter(|r| r.success)
                .map(|r| r.objective_value)
                .fold(f64::INFINITY, f64::min);
            if current < best_objective {
                best_objective = current;
                info!(checkpoint, best_objective, "adaptive solve improved");
                if matches!(self.config.early_stop_threshold, Some(t) if best_objective <= t) {
                    info!(checkpoint, best_objective, "early stop threshold reached");
                    stop_reason = StopReason::EarlyStop;
                    break;
                }
            }

            if let Some(ref mut monitor) = monitor {
                let successes = results.iter().filter(|r| r.success).count() as u64;
                let failures = results.len() as u64 - successes;
                monitor.heartbeat(checkpoint, best_objective, successes, failures).await;
                if let Some(reason) = monitor.check_abort().await {
                    warn!(run_id = monitor.run_id(), %reason, "abort requested, cancelling instances");
                    stop_reason = StopReason::Aborted;
                    abort_reason = Some(reason);
                    break;
                }
            }

            if Instant::now() >= deadline && !batch.tasks.is_empty() {
                warn!(
                    pending = batch.tasks.len(),
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "adaptive solve deadline reached"
                );
                stop_reason = StopReason::Timeout;
                break;
            }
        }

        let cancelled = batch.cancel_all().await;
        if cancelled > 0 {
            debug!(cancelled, "unfinished instances cancelled");
        }

        if let Some(ref mut monitor) = monitor {
            match abort_reason {
                Some(ref reason) => monitor.abort(reason).await,
                None => monitor.finish().await,
            };
        }

        results.sort_by_key(|r| r.solver_id);
        let elapsed = started.elapsed();
        let best = SolverResult::select_best(&results, elapsed);
        info!(
            checkpoints = checkpoint,
            collected = results.len(),
            cancelled,
            best_solver = best.solver_id,
            best_objective = best.objective_value,
            stop_reason = ?stop_reason,
            "adaptive solve finished"
        );

        ParallelReport {
            best,
            results,
            elapsed,
            stop_reason,
        }
    }
}
