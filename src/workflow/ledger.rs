//! Workflow transition ledger.
//!
//! Best-effort bookkeeping: every attempt is recorded, invalid ones are
//! logged and reported through the return value, nothing here fails.

use super::analytics::StateAnalytics;
use super::state::WorkflowState;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Records kept per workflow; the oldest are dropped first.
    pub max_history_length: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_history_length: 100,
        }
    }
}

/// One workflow-level transition attempt, valid or not.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransitionRecord {
    pub workflow_id: String,
    /// `None` when the workflow was not tracked at the time of the attempt.
    pub from_state: Option<WorkflowState>,
    pub to_state: WorkflowState,
    pub trigger_event: String,
    pub timestamp: DateTime<Utc>,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Default)]
struct LedgerInner {
    current: HashMap<String, WorkflowState>,
    history: HashMap<String, VecDeque<StateTransitionRecord>>,
}

/// Tracks the current state of every workflow and an audit trail of
/// transition attempts against the fixed lifecycle table.
pub struct TransitionLedger {
    config: LedgerConfig,
    inner: Mutex<LedgerInner>,
}

impl Default for TransitionLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl TransitionLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Start tracking a workflow. Returns false if it is already tracked.
    pub fn initialize_workflow_state(&self, workflow_id: &str, initial: WorkflowState) -> bool {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.current.get(workflow_id) {
            tracing::warn!(
                workflow_id,
                current = %existing,
                requested = %initial,
                "Workflow already initialized"
            );
            return false;
        }
        inner.current.insert(workflow_id.to_string(), initial);
        tracing::debug!(workflow_id, state = %initial, "Workflow initialized");
        true
    }

    /// Attempt a transition. The attempt is always recorded; the current
    /// state changes only when the lifecycle table allows the move.
    pub fn transition_workflow_state(
        &self,
        workflow_id: &str,
        new_state: WorkflowState,
        trigger_event: &str,
        context: Option<Value>,
    ) -> bool {
        let capacity = self.config.max_history_length.max(1);
        let mut inner = self.inner.lock();
        let from_state = inner.current.get(workflow_id).copied();

        let error = match from_state {
            None => Some(format!("workflow '{workflow_id}' is not tracked")),
            Some(from) if !from.can_transition_to(new_state) => {
                Some(format!("invalid transition from {from} to {new_state}"))
            }
            Some(_) => None,
        };
        let is_valid = error.is_none();

        match &error {
            None => tracing::debug!(
                workflow_id,
                from = ?from_state,
                to = %new_state,
                trigger = trigger_event,
                "Workflow transition"
            ),
            Some(reason) => tracing::warn!(
                workflow_id,
                from = ?from_state,
                to = %new_state,
                trigger = trigger_event,
                reason = %reason,
                "Rejected workflow transition"
            ),
        }

        let record = StateTransitionRecord {
            workflow_id: workflow_id.to_string(),
            from_state,
            to_state: new_state,
            trigger_event: trigger_event.to_string(),
            timestamp: Utc::now(),
            is_valid,
            error,
            context,
        };

        let records = inner.history.entry(workflow_id.to_string()).or_default();
        records.push_back(record);
        while records.len() > capacity {
            records.pop_front();
        }

        if is_valid {
            inner.current.insert(workflow_id.to_string(), new_state);
        }
        is_valid
    }

    pub fn current_state(&self, workflow_id: &str) -> Option<WorkflowState> {
        self.inner.lock().current.get(workflow_id).copied()
    }

    /// Recorded attempts for a workflow, oldest first.
    pub fn get_state_history(&self, workflow_id: &str) -> Vec<StateTransitionRecord> {
        self.inner
            .lock()
            .history
            .get(workflow_id)
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every recorded attempt, grouped by workflow id.
    pub fn all_records(&self) -> Vec<StateTransitionRecord> {
        let inner = self.inner.lock();
        let mut workflows: Vec<&String> = inner.history.keys().collect();
        workflows.sort();
        workflows
            .into_iter()
            .filter_map(|wf| inner.history.get(wf))
            .flat_map(|records| records.iter().cloned())
            .collect()
    }

    /// Analytics for one workflow, or across all workflows with `None`.
    pub fn get_state_analytics(&self, workflow_id: Option<&str>) -> StateAnalytics {
        let records = match workflow_id {
            Some(wf) => self.get_state_history(wf),
            None => self.all_records(),
        };
        StateAnalytics::from_records(&records)
    }

    pub fn tracked_workflows(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.lock().current.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Forget a workflow's state and history. Returns false if unknown.
    pub fn remove_workflow(&self, workflow_id: &str) -> bool {
        let mut inner = self.inner.lock();
        let tracked = inner.current.remove(workflow_id).is_some();
        let recorded = inner.history.remove(workflow_id).is_some();
        tracked || recorded
    }

    /// Trim every workflow's history to its newest `keep_last` records.
    /// Returns how many records were dropped.
    pub fn prune_history(&self, keep_last: usize) -> usize {
        let mut inner = self.inner.lock();
        let mut removed = 0;
        for records in inner.history.values_mut() {
            while records.len() > keep_last {
                records.pop_front();
                removed += 1;
            }
        }
        inner.history.retain(|_, records| !records.is_empty());
        if removed > 0 {
            tracing::info!(removed, keep_last, "Pruned workflow transition history");
        }
        removed
    }
}
