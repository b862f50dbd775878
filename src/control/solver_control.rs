//! Abort flags, progress heartbeats and partial results over a shared store.

use super::config::ControlConfig;
use super::store::KeyValueStore;
use super::types::{AbortRecord, PartialResult, PartialResultRecord, ProgressRecord, ProgressUpdate, RunStatus};
use crate::error::StoreResult;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cooperative run control for long-running solves.
///
/// Every operation is advisory and best-effort. Store failures are logged
/// and degrade to "nothing there" or `false`; none of them reach the
/// caller, so an outage of the store never stops a solve.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_roster::control::{MemoryStore, SolverControl};
///
/// # #[tokio::main]
/// # async fn main() {
/// let control = SolverControl::new(Arc::new(MemoryStore::new()));
/// assert_eq!(control.should_abort("run-7").await, None);
///
/// control.request_abort("run-7", "timeout exceeded", "scheduler").await;
/// assert_eq!(control.should_abort("run-7").await.as_deref(), Some("timeout exceeded"));
/// # }
/// ```
#[derive(Clone)]
pub struct SolverControl {
    store: Arc<dyn KeyValueStore>,
    config: ControlConfig,
}

impl std::fmt::Debug for SolverControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverControl").field("config", &self.config).finish_non_exhaustive()
    }
}

impl SolverControl {
    /// Creates a control handle with the default keyspace layout.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, ControlConfig::default())
    }

    /// Creates a control handle with a custom keyspace layout.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn with_config(store: Arc<dyn KeyValueStore>, config: ControlConfig) -> Self {
        config.validate().expect("invalid ControlConfig");
        Self { store, config }
    }

    /// The keyspace layout.
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    // ---- abort flag ----

    /// Raises the abort flag for `run_id`. Repeated requests overwrite it.
    ///
    /// Returns whether the flag was written.
    pub async fn request_abort(&self, run_id: &str, reason: &str, requested_by: &str) -> bool {
        let record = AbortRecord {
            reason: reason.to_string(),
            requested_by: requested_by.to_string(),
            requested_at: Utc::now(),
        };
        let written: StoreResult<()> = async {
            let payload = serde_json::to_string(&record)?;
            self.store
                .set(&self.config.abort_key(run_id), &payload, Some(self.config.abort_ttl))
                .await
        }
        .await;

        match written {
            Ok(()) => {
                info!(run_id, reason, requested_by, "abort requested");
                true
            }
            Err(err) => {
                warn!(run_id, error = %err, "failed to write abort flag");
                false
            }
        }
    }

    /// Abort reason for `run_id`, if the flag is raised.
    ///
    /// Meant to be polled every iteration. A store failure reads as "no
    /// abort".
    pub async fn should_abort(&self, run_id: &str) -> Option<String> {
        self.get_abort_info(run_id).await.map(|record| record.reason)
    }

    /// Full abort flag contents for `run_id`.
    pub async fn get_abort_info(&self, run_id: &str) -> Option<AbortRecord> {
        let read: StoreResult<Option<AbortRecord>> = async {
            match self.store.get(&self.config.abort_key(run_id)).await? {
                Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
                None => Ok(None),
            }
        }
        .await;

        read.unwrap_or_else(|err| {
            warn!(run_id, error = %err, "abort check failed, continuing");
            None
        })
    }

    /// Lowers the abort flag. Returns whether a flag was removed.
    pub async fn clear_abort(&self, run_id: &str) -> bool {
        match self.store.delete(&self.config.abort_key(run_id)).await {
            Ok(removed) => {
                if removed {
                    debug!(run_id, "abort flag cleared");
                }
                removed
            }
            Err(err) => {
                warn!(run_id, error = %err, "failed to clear abort flag");
                false
            }
        }
    }

    // ---- progress ----

    /// Overwrites the heartbeat for `run_id` and refreshes its lifetime.
    pub async fn update_progress(&self, run_id: &str, update: &ProgressUpdate) -> bool {
        let key = self.config.progress_key(run_id);
        let fields = ProgressRecord::to_fields(update, Utc::now());
        let written: StoreResult<()> = async {
            self.store.hset(&key, &fields).await?;
            self.store.expire(&key, self.config.progress_ttl).await?;
            Ok(())
        }
        .await;

        match written {
            Ok(()) => {
                debug!(
                    run_id,
                    iteration = update.iteration,
                    best_score = update.best_score,
                    status = %update.status,
                    "progress updated"
                );
                true
            }
            Err(err) => {
                warn!(run_id, error = %err, "failed to write progress");
                false
            }
        }
    }

    /// Latest heartbeat for `run_id`.
    pub async fn get_progress(&self, run_id: &str) -> Option<ProgressRecord> {
        match self.store.hgetall(&self.config.progress_key(run_id)).await {
            Ok(fields) if fields.is_empty() => None,
            Ok(fields) => {
                let record = ProgressRecord::from_fields(run_id, &fields);
                if record.is_none() {
                    warn!(run_id, "malformed progress record");
                }
                record
            }
            Err(err) => {
                warn!(run_id, error = %err, "failed to read progress");
                None
            }
        }
    }

    // ---- partial result ----

    /// Stores the best-so-far result of a stopped run.
    pub async fn save_partial_result(&self, run_id: &str, result: &PartialResult) -> bool {
        let record = PartialResultRecord {
            assignments_count: result.assignments_count,
            score: result.score,
            reason: result.reason.clone(),
            saved_at: Utc::now(),
            is_partial: true,
        };
        let written: StoreResult<()> = async {
            let payload = serde_json::to_string(&record)?;
            self.store
                .set(&self.config.result_key(run_id), &payload, Some(self.config.result_ttl))
                .await
        }
        .await;

        match written {
            Ok(()) => {
                info!(run_id, score = result.score, reason = %result.reason, "partial result saved");
                true
            }
            Err(err) => {
                warn!(run_id, error = %err, "failed to save partial result");
                false
            }
        }
    }

    /// Stored partial result for `run_id`.
    pub async fn get_partial_result(&self, run_id: &str) -> Option<PartialResultRecord> {
        let read: StoreResult<Option<PartialResultRecord>> = async {
            match self.store.get(&self.config.result_key(run_id)).await? {
                Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
                None => Ok(None),
            }
        }
        .await;

        read.unwrap_or_else(|err| {
            warn!(run_id, error = %err, "failed to read partial result");
            None
        })
    }

    // ---- housekeeping ----

    /// Heartbeats of every run currently in the `running` state, by run id.
    pub async fn get_active_runs(&self) -> Vec<ProgressRecord> {
        let keys = match self.store.scan_prefix(&self.config.progress_prefix).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "failed to scan progress records");
                return Vec::new();
            }
        };

        let mut runs = Vec::new();
        for key in keys {
            let run_id = &key[self.config.progress_prefix.len()..];
            if let Some(record) = self.get_progress(run_id).await {
                if record.status == RunStatus::Running {
                    runs.push(record);
                }
            }
        }
        runs.sort_by(|a, b| a.run_id.cmp(&b.run_id));
        runs
    }

    /// Removes heartbeats older than `max_age` and abort flags whose run
    /// has no remaining heartbeat. Returns the number of keys removed.
    pub async fn cleanup_stale(&self, max_age: Duration) -> usize {
        let max_age = chrono::Duration::from_std(max_age).ok();
        let now = Utc::now();
        let mut removed = 0;

        match self.store.scan_prefix(&self.config.progress_prefix).await {
            Ok(keys) => {
                for key in keys {
                    let run_id = &key[self.config.progress_prefix.len()..];
                    let stale = match self.store.hgetall(&key).await {
                        Ok(fields) => match ProgressRecord::from_fields(run_id, &fields) {
                            Some(record) => max_age.is_some_and(|m| now.signed_duration_since(record.updated_at) > m),
                            None => true,
                        },
                        Err(err) => {
                            warn!(run_id, error = %err, "failed to read progress during cleanup");
                            false
                        }
                    };
                    if stale && self.delete_quietly(&key).await {
                        removed += 1;
                    }
                }
            }
            Err(err) => warn!(error = %err, "failed to scan progress records"),
        }

        match self.store.scan_prefix(&self.config.abort_prefix).await {
            Ok(keys) => {
                for key in keys {
                    let run_id = &key[self.config.abort_prefix.len()..];
                    let orphaned = match self.store.hgetall(&self.config.progress_key(run_id)).await {
                        Ok(fields) => fields.is_empty(),
                        Err(err) => {
                            warn!(run_id, error = %err, "failed to read progress during cleanup");
                            false
                        }
                    };
                    if orphaned && self.delete_quietly(&key).await {
                        removed += 1;
                    }
                }
            }
            Err(err) => warn!(error = %err, "failed to scan abort flags"),
        }

        if removed > 0 {
            info!(removed, "stale run control keys removed");
        }
        removed
    }

    async fn delete_quietly(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(removed) => removed,
            Err(err) => {
                warn!(key, error = %err, "failed to delete key");
                false
            }
        }
    }
}
