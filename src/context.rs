//! Explicitly constructed engine context.
//!
//! Owns the shared store and the run-control surface so nothing in the
//! crate relies on process-wide state. Build one at startup, hand out
//! solvers and monitors from it, and call [`EngineContext::shutdown`] on
//! the way out.

use crate::control::{ControlConfig, KeyValueStore, MemoryStore, RunMonitor, SolverControl};
use crate::ga::Nsga2Config;
use crate::parallel::{AdaptiveParallelSolver, ParallelConfig, ParallelSolver};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Configuration of every engine component.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Parallel orchestration settings.
    pub parallel: ParallelConfig,
    /// Run-control keyspace layout.
    pub control: ControlConfig,
    /// Evolutionary search settings.
    pub nsga2: Nsga2Config,
    /// Heartbeat age after which [`EngineContext::shutdown`] discards a run.
    pub stale_run_max_age: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: ParallelConfig::default(),
            control: ControlConfig::default(),
            nsga2: Nsga2Config::default(),
            stale_run_max_age: Duration::from_secs(7200),
        }
    }
}

impl EngineConfig {
    /// Sets the parallel orchestration settings.
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the run-control keyspace layout.
    pub fn with_control(mut self, control: ControlConfig) -> Self {
        self.control = control;
        self
    }

    /// Sets the evolutionary search settings.
    pub fn with_nsga2(mut self, nsga2: Nsga2Config) -> Self {
        self.nsga2 = nsga2;
        self
    }

    /// Sets the stale-run cutoff used at shutdown.
    pub fn with_stale_run_max_age(mut self, max_age: Duration) -> Self {
        self.stale_run_max_age = max_age;
        self
    }

    /// Validates every component.
    pub fn validate(&self) -> Result<(), String> {
        self.parallel.validate().map_err(|e| format!("parallel: {e}"))?;
        self.control.validate().map_err(|e| format!("control: {e}"))?;
        self.nsga2.validate().map_err(|e| format!("nsga2: {e}"))?;
        Ok(())
    }
}

/// Startup-scoped owner of the shared engine services.
#[derive(Debug, Clone)]
pub struct EngineContext {
    config: EngineConfig,
    control: SolverControl,
}

impl EngineContext {
    /// Creates a context backed by an in-process [`MemoryStore`].
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Creates a context backed by `store`.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn with_store(config: EngineConfig, store: Arc<dyn KeyValueStore>) -> Self {
        config.validate().expect("invalid EngineConfig");
        let control = SolverControl::with_config(store, config.control.clone());
        info!(
            num_solvers = config.parallel.num_solvers,
            population_size = config.nsga2.population_size,
            "engine context created"
        );
        Self { config, control }
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        self.control.store()
    }

    /// The run-control surface.
    pub fn control(&self) -> &SolverControl {
        &self.control
    }

    /// A parallel solver using the configured settings.
    pub fn parallel_solver(&self) -> ParallelSolver {
        ParallelSolver::new(self.config.parallel.clone())
    }

    /// An adaptive solver, bound to `run_id` for heartbeats and aborts
    /// when one is given.
    pub fn adaptive_solver(&self, run_id: Option<&str>) -> AdaptiveParallelSolver {
        let solver = AdaptiveParallelSolver::new(self.config.parallel.clone());
        match run_id {
            Some(run_id) => solver.with_abort_control(self.control.clone(), run_id),
            None => solver,
        }
    }

    /// A monitor for a solver loop running under `run_id`.
    pub fn run_monitor(&self, run_id: impl Into<String>) -> RunMonitor {
        RunMonitor::new(self.control.clone(), run_id)
    }

    /// Discards stale run-control records. Returns how many keys went.
    pub async fn shutdown(self) -> usize {
        let removed = self.control.cleanup_stale(self.config.stale_run_max_age).await;
        info!(removed, "engine context shut down");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ProgressRecord;
    use crate::error::SolverError;
    use crate::parallel::{InstanceContext, ProblemData, Solution};
    use chrono::Utc;

    #[test]
    fn test_default_config_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_names_component() {
        let config = EngineConfig::default().with_parallel(ParallelConfig::default().with_num_solvers(0));
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("parallel:"));
    }

    #[test]
    #[should_panic(expected = "invalid EngineConfig")]
    fn test_invalid_config_panics() {
        let _ = EngineContext::new(EngineConfig::default().with_parallel(ParallelConfig::default().with_num_solvers(0)));
    }

    #[tokio::test]
    async fn test_context_shares_control() {
        let ctx = EngineContext::new(EngineConfig::default());
        let mut monitor = ctx.run_monitor("run-a");
        monitor.heartbeat(1, 2.0, 3, 0).await;

        assert_eq!(ctx.control().get_active_runs().await.len(), 1);
        ctx.control().request_abort("run-a", "stop", "test").await;
        assert_eq!(monitor.check_abort().await.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_context_solvers_use_config() {
        let ctx = EngineContext::new(
            EngineConfig::default().with_parallel(ParallelConfig::default().with_num_solvers(3)),
        );
        assert_eq!(ctx.parallel_solver().config().num_solvers, 3);

        let best = ctx
            .adaptive_solver(Some("run-b"))
            .solve_adaptive(
                &ProblemData::new(),
                |_p: ProblemData, ctx: InstanceContext| async move {
                    Ok::<_, SolverError>(Solution::new(ctx.solver_id as f64))
                },
                None,
            )
            .await;
        assert_eq!(best.solver_id, 0);
        assert!(ctx.control().get_progress("run-b").await.is_some());
    }

    #[tokio::test]
    async fn test_shutdown_cleans_stale() {
        let ctx = EngineContext::new(EngineConfig::default().with_stale_run_max_age(Duration::from_secs(60)));
        let old = ProgressRecord::to_fields(&Default::default(), Utc::now() - chrono::Duration::minutes(5));
        ctx.store().hset("solver:progress:old", &old).await.unwrap();
        ctx.run_monitor("fresh").heartbeat(1, 1.0, 1, 0).await;

        let store = Arc::clone(ctx.store());
        assert_eq!(ctx.shutdown().await, 1);
        assert_eq!(store.scan_prefix("solver:progress:").await.unwrap(), vec!["solver:progress:fresh"]);
    }
}
