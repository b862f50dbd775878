//! Solver contract and result types for parallel orchestration.

use crate::error::SolverError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Problem input handed to each solver instance.
///
/// A string-keyed map of JSON values. Every instance receives its own
/// clone, so instances never observe each other's edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemData {
    fields: Map<String, Value>,
}

impl ProblemData {
    /// Creates empty problem data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Looks up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Looks up an unsigned integer field.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    /// Looks up a float field.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Looks up a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A copy of `self` with `variant`'s fields layered on top.
    pub fn merged(&self, variant: &StrategyVariant) -> Self {
        let mut merged = self.clone();
        variant.apply_to(&mut merged);
        merged
    }
}

impl From<Map<String, Value>> for ProblemData {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Per-instance overrides merged into [`ProblemData`].
///
/// Named fields are written under the keys `seed`, `heuristic` and
/// `search_strategy`; `params` entries are written verbatim and win over
/// the named ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyVariant {
    /// Random seed for this instance.
    pub seed: Option<u64>,
    /// Construction heuristic name.
    pub heuristic: Option<String>,
    /// Search strategy name.
    pub search_strategy: Option<String>,
    /// Additional solver-specific overrides.
    pub params: Map<String, Value>,
}

impl StrategyVariant {
    /// Creates an empty variant.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the heuristic name.
    pub fn with_heuristic(mut self, name: impl Into<String>) -> Self {
        self.heuristic = Some(name.into());
        self
    }

    /// Sets the search strategy name.
    pub fn with_search_strategy(mut self, name: impl Into<String>) -> Self {
        self.search_strategy = Some(name.into());
        self
    }

    /// Adds a free-form override.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    fn apply_to(&self, data: &mut ProblemData) {
        if let Some(seed) = self.seed {
            data.insert("seed", seed);
        }
        if let Some(ref heuristic) = self.heuristic {
            data.insert("heuristic", heuristic.clone());
        }
        if let Some(ref strategy) = self.search_strategy {
            data.insert("search_strategy", strategy.clone());
        }
        for (key, value) in &self.params {
            data.insert(key.clone(), value.clone());
        }
    }
}

/// What a solver instance returns.
///
/// Lower `objective_value` is better. Fields a backend does not report
/// keep their defaults: `+inf` objective and zero iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Minimization score used to rank instances against each other.
    pub objective_value: f64,
    /// Iterations the solver performed.
    pub iterations: u64,
    /// Solver-specific solution body.
    pub payload: Value,
}

impl Default for Solution {
    fn default() -> Self {
        Self {
            objective_value: f64::INFINITY,
            iterations: 0,
            payload: Value::Null,
        }
    }
}

impl Solution {
    /// A solution with the given objective and no payload.
    pub fn new(objective_value: f64) -> Self {
        Self {
            objective_value,
            ..Self::default()
        }
    }

    /// Sets the iteration count.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the payload.
    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Reads a loosely-typed backend response.
    ///
    /// Takes `objective_value` and `iterations` from a JSON object when
    /// present and numeric, falling back to the defaults otherwise. The
    /// whole value is kept as the payload.
    pub fn from_value(value: Value) -> Self {
        let objective_value = value
            .get("objective_value")
            .and_then(Value::as_f64)
            .unwrap_or(f64::INFINITY);
        let iterations = value.get("iterations").and_then(Value::as_u64).unwrap_or(0);
        Self {
            objective_value,
            iterations,
            payload: value,
        }
    }
}

/// Outcome of one solver instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResult {
    /// Index of the instance, `0..num_solvers`.
    pub solver_id: usize,
    /// Whether the instance produced a solution.
    pub success: bool,
    /// The solution, when successful.
    pub solution: Option<Solution>,
    /// Objective value; `+inf` on failure.
    pub objective_value: f64,
    /// Wall-clock time the instance ran.
    pub duration: Duration,
    /// Iterations reported by the solver.
    pub iterations: u64,
    /// Failure description.
    pub error: Option<String>,
}

impl SolverResult {
    /// `solver_id` of the synthetic result returned when no instance succeeds.
    pub const AGGREGATE_ID: usize = usize::MAX;

    /// Successful outcome.
    pub fn success(solver_id: usize, solution: Solution, duration: Duration) -> Self {
        Self {
            solver_id,
            success: true,
            objective_value: solution.objective_value,
            iterations: solution.iterations,
            solution: Some(solution),
            duration,
            error: None,
        }
    }

    /// Failed outcome.
    pub fn failure(solver_id: usize, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            solver_id,
            success: false,
            solution: None,
            objective_value: f64::INFINITY,
            duration,
            iterations: 0,
            error: Some(error.into()),
        }
    }

    /// Picks the successful result with the lowest objective.
    ///
    /// Order-independent: ties go to the lower `solver_id`, and a NaN
    /// objective never wins. When nothing usable succeeded, returns one
    /// synthetic failure carrying [`AGGREGATE_ID`](Self::AGGREGATE_ID).
    pub fn select_best(results: &[SolverResult], elapsed: Duration) -> SolverResult {
        results
            .iter()
            .filter(|r| r.success && !r.objective_value.is_nan())
            .min_by(|a, b| {
                a.objective_value
                    .total_cmp(&b.objective_value)
                    .then(a.solver_id.cmp(&b.solver_id))
            })
            .cloned()
            .unwrap_or_else(|| {
                Self::failure(
                    Self::AGGREGATE_ID,
                    format!("all {} solver instances failed", results.len()),
                    elapsed,
                )
            })
    }
}

/// Per-instance context passed to the solver.
///
/// Poll [`is_cancelled`](Self::is_cancelled) at safe checkpoints and stop
/// early when it turns `true`.
#[derive(Debug, Clone)]
pub struct InstanceContext {
    /// Index of this instance.
    pub solver_id: usize,
    cancel: Arc<AtomicBool>,
}

impl InstanceContext {
    /// Creates a context around a cancellation flag.
    pub fn new(solver_id: usize, cancel: Arc<AtomicBool>) -> Self {
        Self { solver_id, cancel }
    }

    /// Whether the orchestrator asked this instance to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// The raw flag, for handing to runners such as
    /// [`Nsga2Runner::run_with_cancel`](crate::ga::Nsga2Runner::run_with_cancel).
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }
}

/// Caller-supplied solver run by every instance.
///
/// Implemented for any `Fn(ProblemData, InstanceContext) -> impl Future`
/// closure, so most callers pass an `async move` closure directly.
#[async_trait]
pub trait InstanceSolver: Send + Sync + 'static {
    /// Solves one instance of the problem.
    async fn solve(&self, problem: ProblemData, ctx: InstanceContext) -> Result<Solution, SolverError>;
}

#[async_trait]
impl<F, Fut> InstanceSolver for F
where
    F: Fn(ProblemData, InstanceContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Solution, SolverError>> + Send + 'static,
{
    async fn solve(&self, problem: ProblemData, ctx: InstanceContext) -> Result<Solution, SolverError> {
        (self)(problem, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merged_does_not_touch_base() {
        let base = ProblemData::new().with("residents", 12).with("seed", 1);
        let variant = StrategyVariant::new().with_seed(2000).with_heuristic("greedy");
        let merged = base.merged(&variant);
        assert_eq!(base.get_u64("seed"), Some(1));
        assert_eq!(merged.get_u64("seed"), Some(2000));
        assert_eq!(merged.get_str("heuristic"), Some("greedy"));
        assert_eq!(merged.get_u64("residents"), Some(12));
    }

    #[test]
    fn test_params_override_named_fields() {
        let variant = StrategyVariant::new().with_seed(1).with_param("seed", 5);
        let merged = ProblemData::new().merged(&variant);
        assert_eq!(merged.get_u64("seed"), Some(5));
    }

    #[test]
    fn test_solution_defaults() {
        let s = Solution::default();
        assert!(s.objective_value.is_infinite());
        assert_eq!(s.iterations, 0);
    }

    #[test]
    fn test_solution_from_value_missing_keys() {
        let s = Solution::from_value(json!({"status": "ok"}));
        assert!(s.objective_value.is_infinite());
        assert_eq!(s.iterations, 0);

        let s = Solution::from_value(json!({"objective_value": 3.5, "iterations": 10}));
        assert_eq!(s.objective_value, 3.5);
        assert_eq!(s.iterations, 10);
    }

    #[test]
    fn test_select_best_minimum() {
        let d = Duration::from_millis(1);
        let results = vec![
            SolverResult::success(0, Solution::new(5.0), d),
            SolverResult::failure(1, "boom", d),
            SolverResult::success(2, Solution::new(1.0), d),
            SolverResult::success(3, Solution::new(2.0), d),
        ];
        assert_eq!(SolverResult::select_best(&results, d).solver_id, 2);
    }

    #[test]
    fn test_select_best_all_failed() {
        let d = Duration::from_millis(1);
        let results = vec![SolverResult::failure(0, "a", d), SolverResult::failure(1, "b", d)];
        let best = SolverResult::select_best(&results, d);
        assert!(!best.success);
        assert!(best.objective_value.is_infinite());
        assert_eq!(best.solver_id, SolverResult::AGGREGATE_ID);
        assert!(best.error.is_some());
    }

    #[test]
    fn test_select_best_skips_nan_in_any_order() {
        let d = Duration::from_millis(1);
        let nan = SolverResult::success(0, Solution::new(f64::NAN), d);
        let one = SolverResult::success(1, Solution::new(1.0), d);

        for results in [vec![nan.clone(), one.clone()], vec![one.clone(), nan.clone()]] {
            let best = SolverResult::select_best(&results, d);
            assert_eq!(best.solver_id, 1);
            assert_eq!(best.objective_value, 1.0);
        }

        let best = SolverResult::select_best(&[nan], d);
        assert!(!best.success);
        assert_eq!(best.solver_id, SolverResult::AGGREGATE_ID);
    }

    #[test]
    fn test_select_best_ties_to_lowest_id() {
        let d = Duration::from_millis(1);
        let a = SolverResult::success(3, Solution::new(2.0), d);
        let b = SolverResult::success(1, Solution::new(2.0), d);
        assert_eq!(SolverResult::select_best(&[a.clone(), b.clone()], d).solver_id, 1);
        assert_eq!(SolverResult::select_best(&[b, a], d).solver_id, 1);
    }

    #[test]
    fn test_select_best_empty() {
        let best = SolverResult::select_best(&[], Duration::ZERO);
        assert!(!best.success);
    }

    #[test]
    fn test_context_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = InstanceContext::new(3, flag.clone());
        assert!(!ctx.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(ctx.is_cancelled());
        assert!(ctx.cancel_flag().load(Ordering::Relaxed));
    }
}
