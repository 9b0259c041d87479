//! Bounded in-memory checkpoint store.

use super::{Checkpoint, CheckpointRequest};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Oldest checkpoints are evicted beyond this count. Values below one
    /// are treated as one.
    pub max_checkpoints_per_workflow: usize,
    /// Default retention for [`CheckpointStore::cleanup`].
    pub retention_hours: u64,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            max_checkpoints_per_workflow: 10,
            retention_hours: 24,
        }
    }
}

/// Counts from one expiry sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub removed_checkpoints: usize,
    pub affected_workflows: usize,
}

#[derive(Default)]
struct StoreInner {
    checkpoints: HashMap<Uuid, Checkpoint>,
    /// Checkpoint ids per workflow, oldest first.
    by_workflow: HashMap<String, VecDeque<Uuid>>,
}

impl StoreInner {
    fn collect(&self, workflow_id: &str) -> Vec<Checkpoint> {
        self.by_workflow
            .get(workflow_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.checkpoints.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Per-workflow bounded store of checkpoints.
///
/// One coarse lock guards the checkpoint map and the per-workflow index.
/// Critical sections are O(checkpoints for the workflow) and never do I/O.
/// Expiry is a plain call for an external scheduler; the store runs no
/// background work.
pub struct CheckpointStore {
    config: CheckpointConfig,
    inner: Mutex<StoreInner>,
}

impl Default for CheckpointStore {
    fn default() -> Self {
        Self::new(CheckpointConfig::default())
    }
}

impl CheckpointStore {
    pub fn new(config: CheckpointConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(StoreInner::default()),
        }
    }

    pub fn with_max_checkpoints(max_checkpoints_per_workflow: usize) -> Self {
        Self::new(CheckpointConfig {
            max_checkpoints_per_workflow,
            ..CheckpointConfig::default()
        })
    }

    pub fn config(&self) -> &CheckpointConfig {
        &self.config
    }

    fn capacity(&self) -> usize {
        self.config.max_checkpoints_per_workflow.max(1)
    }

    /// Create a checkpoint stamped with the current time.
    pub fn create_checkpoint(&self, request: CheckpointRequest) -> Uuid {
        self.create_checkpoint_at(request, Utc::now())
    }

    /// Create a checkpoint with an explicit timestamp.
    ///
    /// Timestamps within one workflow never decrease: a timestamp older than
    /// the workflow's newest checkpoint is raised to match it.
    pub fn create_checkpoint_at(&self, request: CheckpointRequest, timestamp: DateTime<Utc>) -> Uuid {
        let capacity = self.capacity();
        let mut inner = self.inner.lock();

        let newest = inner
            .by_workflow
            .get(&request.workflow_id)
            .and_then(|ids| ids.back())
            .and_then(|id| inner.checkpoints.get(id))
            .map(|cp| cp.timestamp);
        let timestamp = newest.map_or(timestamp, |n| timestamp.max(n));

        let checkpoint = request.into_checkpoint(timestamp);
        let id = checkpoint.id;
        let workflow_id = checkpoint.workflow_id.clone();

        tracing::debug!(
            workflow_id = %workflow_id,
            checkpoint_id = %id,
            name = %checkpoint.name,
            recovery_point = checkpoint.is_recovery_point,
            "Created checkpoint"
        );
        inner.checkpoints.insert(id, checkpoint);

        let StoreInner {
            checkpoints,
            by_workflow,
        } = &mut *inner;
        let ids = by_workflow.entry(workflow_id.clone()).or_default();
        ids.push_back(id);
        while ids.len() > capacity {
            if let Some(evicted) = ids.pop_front() {
                checkpoints.remove(&evicted);
                tracing::debug!(
                    workflow_id = %workflow_id,
                    checkpoint_id = %evicted,
                    capacity,
                    "Evicted oldest checkpoint"
                );
            }
        }

        id
    }

    pub fn get_checkpoint(&self, id: &Uuid) -> Option<Checkpoint> {
        self.inner.lock().checkpoints.get(id).cloned()
    }

    /// Checkpoints for a workflow in creation order.
    pub fn get_checkpoints(&self, workflow_id: &str) -> Vec<Checkpoint> {
        self.inner.lock().collect(workflow_id)
    }

    /// Recovery-point checkpoints for a workflow in creation order.
    pub fn get_recovery_checkpoints(&self, workflow_id: &str) -> Vec<Checkpoint> {
        let mut checkpoints = self.get_checkpoints(workflow_id);
        checkpoints.retain(|cp| cp.is_recovery_point);
        checkpoints
    }

    pub fn latest_checkpoint(&self, workflow_id: &str) -> Option<Checkpoint> {
        self.get_checkpoints(workflow_id)
            .into_iter()
            .max_by_key(|cp| cp.timestamp)
    }

    /// Newest recovery point by timestamp.
    pub fn latest_recovery_checkpoint(&self, workflow_id: &str) -> Option<Checkpoint> {
        self.get_recovery_checkpoints(workflow_id)
            .into_iter()
            .max_by_key(|cp| cp.timestamp)
    }

    pub fn delete_checkpoint(&self, id: &Uuid) -> bool {
        let mut inner = self.inner.lock();
        let Some(checkpoint) = inner.checkpoints.remove(id) else {
            return false;
        };
        if let Some(ids) = inner.by_workflow.get_mut(&checkpoint.workflow_id) {
            ids.retain(|other| other != id);
            if ids.is_empty() {
                inner.by_workflow.remove(&checkpoint.workflow_id);
            }
        }
        true
    }

    /// Drop every checkpoint of a workflow, returning how many were removed.
    pub fn remove_workflow(&self, workflow_id: &str) -> usize {
        let mut inner = self.inner.lock();
        let ids = inner.by_workflow.remove(workflow_id).unwrap_or_default();
        for id in &ids {
            inner.checkpoints.remove(id);
        }
        ids.len()
    }

    /// Remove checkpoints older than `retention_hours`.
    pub fn cleanup_expired(&self, retention_hours: u64) -> CleanupReport {
        let hours = i64::try_from(retention_hours).unwrap_or(i64::MAX);
        let cutoff = Duration::try_hours(hours)
            .and_then(|retention| Utc::now().checked_sub_signed(retention))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.cleanup_expired_before(cutoff)
    }

    /// Remove checkpoints using the configured retention.
    pub fn cleanup(&self) -> CleanupReport {
        self.cleanup_expired(self.config.retention_hours)
    }

    /// Remove checkpoints with a timestamp strictly before `cutoff`.
    pub fn cleanup_expired_before(&self, cutoff: DateTime<Utc>) -> CleanupReport {
        let mut inner = self.inner.lock();
        let StoreInner {
            checkpoints,
            by_workflow,
        } = &mut *inner;

        let mut report = CleanupReport::default();
        by_workflow.retain(|_, ids| {
            let before = ids.len();
            ids.retain(|id| {
                let expired = checkpoints
                    .get(id)
                    .map_or(true, |cp| cp.timestamp < cutoff);
                if expired {
                    checkpoints.remove(id);
                }
                !expired
            });
            let removed = before - ids.len();
            if removed > 0 {
                report.removed_checkpoints += removed;
                report.affected_workflows += 1;
            }
            !ids.is_empty()
        });

        if report.removed_checkpoints > 0 {
            tracing::info!(
                removed = report.removed_checkpoints,
                workflows = report.affected_workflows,
                cutoff = %cutoff,
                "Expired checkpoints removed"
            );
        }
        report
    }

    pub fn checkpoint_count(&self) -> usize {
        self.inner.lock().checkpoints.len()
    }

    pub fn workflow_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.lock().by_workflow.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Every stored checkpoint, grouped by workflow id, creation order within.
    pub fn all_checkpoints(&self) -> Vec<Checkpoint> {
        let inner = self.inner.lock();
        let mut workflows: Vec<&String> = inner.by_workflow.keys().collect();
        workflows.sort();
        workflows
            .into_iter()
            .flat_map(|wf| inner.collect(wf))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(workflow: &str, name: &str) -> CheckpointRequest {
        CheckpointRequest::new(workflow, name).workflow_state(json!({ "step": name }))
    }

    #[test]
    fn checkpoints_are_returned_in_creation_order() {
        let store = CheckpointStore::default();
        store.create_checkpoint(request("wf", "a"));
        store.create_checkpoint(request("wf", "b"));
        store.create_checkpoint(request("other", "x"));

        let names: Vec<String> = store
            .get_checkpoints("wf")
            .into_iter()
            .map(|cp| cp.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.checkpoint_count(), 3);
        assert_eq!(store.workflow_ids(), vec!["other", "wf"]);
    }

    #[test]
    fn exceeding_capacity_evicts_oldest_from_both_indexes() {
        let store = CheckpointStore::with_max_checkpoints(2);
        let first = store.create_checkpoint(request("wf", "c1"));
        store.create_checkpoint(request("wf", "c2"));
        store.create_checkpoint(request("wf", "c3"));

        assert!(store.get_checkpoint(&first).is_none());
        assert_eq!(store.checkpoint_count(), 2);
        let names: Vec<String> = store
            .get_checkpoints("wf")
            .into_iter()
            .map(|cp| cp.name)
            .collect();
        assert_eq!(names, vec!["c2", "c3"]);
    }

    #[test]
    fn capacity_is_per_workflow() {
        let store = CheckpointStore::with_max_checkpoints(1);
        store.create_checkpoint(request("a", "1"));
        store.create_checkpoint(request("b", "1"));

        assert_eq!(store.checkpoint_count(), 2);
    }

    #[test]
    fn timestamps_never_decrease_within_a_workflow() {
        let store = CheckpointStore::default();
        let now = Utc::now();
        store.create_checkpoint_at(request("wf", "late"), now);
        store.create_checkpoint_at(request("wf", "early"), now - Duration::hours(1));

        let cps = store.get_checkpoints("wf");
        assert!(cps[0].timestamp <= cps[1].timestamp);
    }

    #[test]
    fn recovery_checkpoints_are_filtered() {
        let store = CheckpointStore::default();
        store.create_checkpoint(request("wf", "a"));
        store.create_checkpoint(request("wf", "b").recovery_point(true));
        store.create_checkpoint(request("wf", "c"));

        let recovery = store.get_recovery_checkpoints("wf");
        assert_eq!(recovery.len(), 1);
        assert_eq!(recovery[0].name, "b");
        assert_eq!(store.latest_recovery_checkpoint("wf").unwrap().name, "b");
        assert_eq!(store.latest_checkpoint("wf").unwrap().name, "c");
    }

    #[test]
    fn latest_recovery_checkpoint_uses_timestamp() {
        let store = CheckpointStore::default();
        let now = Utc::now();
        store.create_checkpoint_at(request("wf", "old").recovery_point(true), now);
        store.create_checkpoint_at(
            request("wf", "new").recovery_point(true),
            now + Duration::minutes(5),
        );

        assert_eq!(store.latest_recovery_checkpoint("wf").unwrap().name, "new");
        assert!(store.latest_recovery_checkpoint("missing").is_none());
    }

    #[test]
    fn cleanup_removes_only_expired() {
        let store = CheckpointStore::default();
        let now = Utc::now();
        store.create_checkpoint_at(request("old", "a"), now - Duration::hours(48));
        store.create_checkpoint_at(request("mixed", "a"), now - Duration::hours(30));
        store.create_checkpoint_at(request("mixed", "b"), now);
        store.create_checkpoint_at(request("fresh", "a"), now);

        let report = store.cleanup_expired(24);

        assert_eq!(
            report,
            CleanupReport {
                removed_checkpoints: 2,
                affected_workflows: 2
            }
        );
        assert!(store.get_checkpoints("old").is_empty());
        assert_eq!(store.get_checkpoints("mixed").len(), 1);
        assert_eq!(store.workflow_ids(), vec!["fresh", "mixed"]);
    }

    #[test]
    fn cleanup_before_future_cutoff_empties_store() {
        let store = CheckpointStore::default();
        store.create_checkpoint(request("wf", "a"));
        store.create_checkpoint(request("wf", "b"));

        let report = store.cleanup_expired_before(Utc::now() + Duration::seconds(1));
        assert_eq!(report.removed_checkpoints, 2);
        assert_eq!(store.checkpoint_count(), 0);
        assert!(store.workflow_ids().is_empty());
    }

    #[test]
    fn delete_and_remove_workflow() {
        let store = CheckpointStore::default();
        let a = store.create_checkpoint(request("wf", "a"));
        store.create_checkpoint(request("wf", "b"));

        assert!(store.delete_checkpoint(&a));
        assert!(!store.delete_checkpoint(&a));
        assert_eq!(store.get_checkpoints("wf").len(), 1);

        assert_eq!(store.remove_workflow("wf"), 1);
        assert_eq!(store.checkpoint_count(), 0);
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let store = CheckpointStore::with_max_checkpoints(0);
        store.create_checkpoint(request("wf", "a"));
        store.create_checkpoint(request("wf", "b"));

        let cps = store.get_checkpoints("wf");
        assert_eq!(cps.len(), 1);
        assert_eq!(cps[0].name, "b");
    }

    #[test]
    fn concurrent_writers_respect_per_workflow_cap() {
        let store = CheckpointStore::with_max_checkpoints(10);

        std::thread::scope(|scope| {
            for t in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    let workflow = if t < 4 {
                        "shared".to_string()
                    } else {
                        format!("wf-{t}")
                    };
                    for i in 0..25 {
                        store.create_checkpoint(request(&workflow, &format!("t{t}-{i}")));
                    }
                });
            }
        });

        assert_eq!(store.workflow_ids().len(), 5);
        for workflow in store.workflow_ids() {
            let cps = store.get_checkpoints(&workflow);
            assert_eq!(cps.len(), 10, "{workflow}");
            assert!(cps.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
        }
        assert_eq!(store.checkpoint_count(), 50);
    }
}
