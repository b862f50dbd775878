//! Parallel orchestration configuration.

use std::time::Duration;

/// Configuration for [`ParallelSolver`](super::ParallelSolver) and
/// [`AdaptiveParallelSolver`](super::AdaptiveParallelSolver).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_roster::parallel::ParallelConfig;
///
/// let config = ParallelConfig::default()
///     .with_num_solvers(8)
///     .with_timeout(Duration::from_secs(120))
///     .with_early_stop_threshold(0.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelConfig {
    /// Number of concurrently running solver instances.
    pub num_solvers: usize,

    /// Per-instance time budget; also the overall adaptive deadline.
    pub timeout: Duration,

    /// How often the adaptive solver inspects finished instances.
    pub checkpoint_interval: Duration,

    /// Objective at or below which the adaptive solver stops early.
    ///
    /// `None` disables early stopping.
    pub early_stop_threshold: Option<f64>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_solvers: 4,
            timeout: Duration::from_secs(300),
            checkpoint_interval: Duration::from_secs(1),
            early_stop_threshold: None,
        }
    }
}

impl ParallelConfig {
    /// Sets the number of solver instances.
    pub fn with_num_solvers(mut self, n: usize) -> Self {
        self.num_solvers = n;
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the timeout in whole seconds.
    pub fn with_timeout_secs(self, secs: u64) -> Self {
        self.with_timeout(Duration::from_secs(secs))
    }

    /// Sets the adaptive checkpoint interval.
    pub fn with_checkpoint_interval(mut self, interval: Duration) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Sets the early-stop objective threshold.
    pub fn with_early_stop_threshold(mut self, threshold: f64) -> Self {
        self.early_stop_threshold = Some(threshold);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_solvers == 0 {
            return Err("num_solvers must be at least 1".into());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be positive".into());
        }
        if self.checkpoint_interval.is_zero() {
            return Err("checkpoint_interval must be positive".into());
        }
        if matches!(self.early_stop_threshold, Some(t) if t.is_nan()) {
            return Err("early_stop_threshold must not be NaN".into());
        }
        Ok(())
    }
}
