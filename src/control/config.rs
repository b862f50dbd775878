//! Keyspace layout for run control.

use std::time::Duration;

/// Key prefixes and expiry for [`SolverControl`](super::SolverControl).
///
/// Defaults match the layout other processes sharing the store expect:
/// `solver:abort:`, `solver:progress:` and `solver:result:` with TTLs of
/// one hour, two hours and one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlConfig {
    /// Prefix of abort flag keys.
    pub abort_prefix: String,
    /// Prefix of progress heartbeat keys.
    pub progress_prefix: String,
    /// Prefix of partial result keys.
    pub result_prefix: String,
    /// Lifetime of an abort flag.
    pub abort_ttl: Duration,
    /// Lifetime of a heartbeat, refreshed on each write.
    pub progress_ttl: Duration,
    /// Lifetime of a partial result.
    pub result_ttl: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            abort_prefix: "solver:abort:".into(),
            progress_prefix: "solver:progress:".into(),
            result_prefix: "solver:result:".into(),
            abort_ttl: Duration::from_secs(3600),
            progress_ttl: Duration::from_secs(7200),
            result_ttl: Duration::from_secs(86400),
        }
    }
}

impl ControlConfig {
    /// Prefixes every keyspace with `namespace:`, for sharing one store
    /// between environments.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.abort_prefix = format!("{namespace}:{}", self.abort_prefix);
        self.progress_prefix = format!("{namespace}:{}", self.progress_prefix);
        self.result_prefix = format!("{namespace}:{}", self.result_prefix);
        self
    }

    /// Sets the abort flag lifetime.
    pub fn with_abort_ttl(mut self, ttl: Duration) -> Self {
        self.abort_ttl = ttl;
        self
    }

    /// Sets the heartbeat lifetime.
    pub fn with_progress_ttl(mut self, ttl: Duration) -> Self {
        self.progress_ttl = ttl;
        self
    }

    /// Sets the partial result lifetime.
    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    pub(crate) fn abort_key(&self, run_id: &str) -> String {
        format!("{}{run_id}", self.abort_prefix)
    }

    pub(crate) fn progress_key(&self, run_id: &str) -> String {
        format!("{}{run_id}", self.progress_prefix)
    }

    pub(crate) fn result_key(&self, run_id: &str) -> String {
        format!("{}{run_id}", self.result_prefix)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let prefixes = [&self.abort_prefix, &self.progress_prefix, &self.result_prefix];
        if prefixes.iter().any(|p| p.is_empty()) {
            return Err("key prefixes must not be empty".into());
        }
        for (i, a) in prefixes.iter().enumerate() {
            for b in &prefixes[i + 1..] {
                if a.starts_with(b.as_str()) || b.starts_with(a.as_str()) {
                    return Err(format!("key prefixes overlap: {a} / {b}"));
                }
            }
        }
        if self.abort_ttl.is_zero() || self.progress_ttl.is_zero() || self.result_ttl.is_zero() {
            return Err("TTLs must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = ControlConfig::default();
        assert_eq!(config.abort_key("r1"), "solver:abort:r1");
        assert_eq!(config.progress_key("r1"), "solver:progress:r1");
        assert_eq!(config.result_key("r1"), "solver:result:r1");
        assert_eq!(config.abort_ttl, Duration::from_secs(3600));
        assert_eq!(config.progress_ttl, Duration::from_secs(7200));
        assert_eq!(config.result_ttl, Duration::from_secs(86400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_namespace() {
        let config = ControlConfig::default().with_namespace("staging");
        assert_eq!(config.abort_key("r"), "staging:solver:abort:r");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_overlap() {
        let mut config = ControlConfig::default();
        config.result_prefix = "solver:".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ttl() {
        let config = ControlConfig::default().with_abort_ttl(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
