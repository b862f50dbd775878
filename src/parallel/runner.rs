//! Fixed-size parallel solver orchestration.

use super::config::ParallelConfig;
use super::strategy::diversified_variants;
use super::types::{InstanceContext, InstanceSolver, ProblemData, SolverResult, StrategyVariant};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{AbortHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Why an orchestration run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every instance finished or timed out.
    Completed,
    /// An instance reached the early-stop threshold.
    EarlyStop,
    /// The overall deadline elapsed with instances still running.
    Timeout,
    /// An external abort request was observed.
    Aborted,
}

/// Full outcome of an orchestration run.
#[derive(Debug, Clone)]
pub struct ParallelReport {
    /// Best successful result, or the aggregate failure.
    pub best: SolverResult,
    /// Collected per-instance results, ordered by `solver_id`.
    ///
    /// Instances cancelled by the adaptive solver are not included.
    pub results: Vec<SolverResult>,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
    /// Why the run stopped.
    pub stop_reason: StopReason,
}

impl ParallelReport {
    /// Number of collected successful instances.
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of collected failed instances.
    pub fn failures(&self) -> usize {
        self.results.len() - self.successes()
    }
}

/// Runs N solver instances concurrently and keeps the best.
///
/// Every instance gets its own copy of the problem, optionally merged with
/// a [`StrategyVariant`], and its own timeout. Errors, panics and timeouts
/// become failed [`SolverResult`]s. A run never fails as a whole: when
/// nothing succeeds the returned result carries
/// [`SolverResult::AGGREGATE_ID`].
///
/// # Examples
///
/// ```
/// use u_roster::parallel::{InstanceContext, ParallelConfig, ParallelSolver, ProblemData, Solution};
/// use u_roster::SolverError;
///
/// # #[tokio::main]
/// # async fn main() {
/// let solver = ParallelSolver::new(ParallelConfig::default().with_num_solvers(3));
/// let best = solver
///     .solve(&ProblemData::new(), |_p: ProblemData, ctx: InstanceContext| async move {
///         Ok::<_, SolverError>(Solution::new(10.0 - ctx.solver_id as f64))
///     }, None)
///     .await;
/// assert_eq!(best.solver_id, 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ParallelSolver {
    config: ParallelConfig,
}

impl ParallelSolver {
    /// Creates a solver.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn new(config: ParallelConfig) -> Self {
        config.validate().expect("invalid ParallelConfig");
        Self { config }
    }

    /// The configuration.
    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Runs all instances and returns the best result.
    ///
    /// `variants[i]` is merged into instance `i`'s input; instances without
    /// a variant receive the unmodified problem.
    pub async fn solve<S: InstanceSolver>(
        &self,
        problem: &ProblemData,
        solver: S,
        variants: Option<Vec<StrategyVariant>>,
    ) -> SolverResult {
        self.solve_detailed(problem, solver, variants).await.best
    }

    /// Like [`solve`](Self::solve), also returning every instance result.
    pub async fn solve_detailed<S: InstanceSolver>(
        &self,
        problem: &ProblemData,
        solver: S,
        variants: Option<Vec<StrategyVariant>>,
    ) -> ParallelReport {
        let started = Instant::now();
        let mut batch = Batch::launch(&self.config, problem, Arc::new(solver), variants.as_deref());

        let mut results = Vec::with_capacity(self.config.num_solvers);
        while let Some(joined) = batch.tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(err) => warn!(error = %err, "solver supervisor task failed"),
            }
        }
        results.sort_by_key(|r| r.solver_id);

        let elapsed = started.elapsed();
        let best = SolverResult::select_best(&results, elapsed);
        info!(
            num_solvers = self.config.num_solvers,
            successes = results.iter().filter(|r| r.success).count(),
            best_solver = best.solver_id,
            best_objective = best.objective_value,
            elapsed_ms = elapsed.as_millis() as u64,
            "parallel solve finished"
        );

        ParallelReport {
            best,
            results,
            elapsed,
            stop_reason: StopReason::Completed,
        }
    }

    /// Runs all instances with seeds and strategies diversified per instance.
    ///
    /// See [`diversified_variants`] for the variant assignment.
    pub async fn solve_with_diversification<S: InstanceSolver>(
        &self,
        problem: &ProblemData,
        solver: S,
    ) -> SolverResult {
        let variants = diversified_variants(self.config.num_solvers);
        self.solve(problem, solver, Some(variants)).await
    }
}

/// A launched set of supervised instances.
pub(crate) struct Batch {
    pub(crate) tasks: JoinSet<SolverResult>,
    cancel_flags: Vec<Arc<AtomicBool>>,
}

impl Batch {
    pub(crate) fn launch<S: InstanceSolver>(
        config: &ParallelConfig,
        problem: &ProblemData,
        solver: Arc<S>,
        variants: Option<&[StrategyVariant]>,
    ) -> Self {
        let mut tasks = JoinSet::new();
        let mut cancel_flags = Vec::with_capacity(config.num_solvers);

        for solver_id in 0..config.num_solvers {
            let input = match variants.and_then(|v| v.get(solver_id)) {
                Some(variant) => problem.merged(variant),
                None => problem.clone(),
            };
            let cancel = Arc::new(AtomicBool::new(false));
            cancel_flags.push(Arc::clone(&cancel));

            let solver = Arc::clone(&solver);
            let timeout = config.timeout;
            tasks.spawn(async move {
                let started = Instant::now();
                let instance = tokio::spawn(run_instance(solver, input, solver_id, timeout, cancel));
                let _guard = AbortOnDrop(instance.abort_handle());
                match instance.await {
                    Ok(result) => result,
                    Err(err) if err.is_panic() => {
                        let message = panic_message(err.into_panic());
                        warn!(solver_id, %message, "solver instance panicked");
                        SolverResult::failure(solver_id, format!("panicked: {message}"), started.elapsed())
                    }
                    Err(_) => SolverResult::failure(solver_id, "cancelled", started.elapsed()),
                }
            });
        }
        debug!(num_solvers = config.num_solvers, "solver instances launched");

        Self { tasks, cancel_flags }
    }

    /// Signals every instance to stop, aborts the tasks and joins them.
    pub(crate) async fn cancel_all(&mut self) -> usize {
        for flag in &self.cancel_flags {
            flag.store(true, Ordering::Relaxed);
        }
        let pending = self.tasks.len();
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        pending
    }
}

async fn run_instance<S: InstanceSolver>(
    solver: Arc<S>,
    problem: ProblemData,
    solver_id: usize,
    timeout: Duration,
    cancel: Arc<AtomicBool>,
) -> SolverResult {
    let started = Instant::now();
    let ctx = InstanceContext::new(solver_id, Arc::clone(&cancel));

    match tokio::time::timeout(timeout, solver.solve(problem, ctx)).await {
        Ok(Ok(solution)) if solution.objective_value.is_nan() => {
            warn!(solver_id, "solver instance returned a NaN objective");
            SolverResult::failure(solver_id, "objective is NaN", started.elapsed())
        }
        Ok(Ok(solution)) => {
            debug!(solver_id, objective = solution.objective_value, "solver instance finished");
            SolverResult::success(solver_id, solution, started.elapsed())
        }
        Ok(Err(err)) => {
            warn!(solver_id, error = %err, "solver instance failed");
            SolverResult::failure(solver_id, err.to_string(), started.elapsed())
        }
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            warn!(solver_id, timeout_ms = timeout.as_millis() as u64, "solver instance timed out");
            SolverResult::failure(solver_id, "timeout", started.elapsed())
        }
    }
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
