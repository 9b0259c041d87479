//! Recovery planning for failed workflows.
//!
//! Plans are recommendations. The planner records every plan it produces
//! for audit but never executes one; an external orchestrator decides.

use super::ledger::TransitionLedger;
use super::state::WorkflowState;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Plans below this probability are logged as low confidence.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    CheckpointRollback,
    PartialRetry,
    CompensatingActions,
    Abort,
}

impl RecoveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckpointRollback => "checkpoint_rollback",
            Self::PartialRetry => "partial_retry",
            Self::CompensatingActions => "compensating_actions",
            Self::Abort => "abort",
        }
    }
}

/// Unrecognized names fall back to [`RecoveryStrategy::Abort`].
impl From<&str> for RecoveryStrategy {
    fn from(name: &str) -> Self {
        match name.trim() {
            "checkpoint_rollback" => Self::CheckpointRollback,
            "partial_retry" => Self::PartialRetry,
            "compensating_actions" => Self::CompensatingActions,
            _ => Self::Abort,
        }
    }
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStep {
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    pub estimated_duration_ms: u64,
}

impl RecoveryStep {
    fn new(name: &str, estimated_duration_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            parameters: BTreeMap::new(),
            estimated_duration_ms,
        }
    }

    fn param(mut self, key: &str, value: Value) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoveryPlan {
    pub id: Uuid,
    pub workflow_id: String,
    pub failure_context: Value,
    pub strategy: RecoveryStrategy,
    pub steps: Vec<RecoveryStep>,
    pub total_estimated_ms: u64,
    pub success_probability: f64,
    /// Checkpoints the plan relies on.
    pub checkpoint_ids: Vec<Uuid>,
    /// Ledger state when the plan was generated, if the workflow is tracked.
    pub workflow_state_at_failure: Option<WorkflowState>,
    pub created_at: DateTime<Utc>,
}

/// Steps, probability and referenced checkpoints for one strategy.
struct PlanOutline {
    steps: Vec<RecoveryStep>,
    success_probability: f64,
    checkpoint_ids: Vec<Uuid>,
}

fn rollback_outline(latest: Option<&Checkpoint>) -> PlanOutline {
    match latest {
        Some(cp) => PlanOutline {
            steps: vec![
                RecoveryStep::new("restore_from_checkpoint", 500)
                    .param("checkpoint_id", json!(cp.id))
                    .param("checkpoint_name", json!(cp.name)),
                RecoveryStep::new("reset_workflow_state", 100)
                    .param("workflow_state", cp.workflow_state.clone()),
                RecoveryStep::new("resume_execution", 1000)
                    .param("from_timestamp", json!(cp.timestamp)),
            ],
            success_probability: 0.8,
            checkpoint_ids: vec![cp.id],
        },
        None => PlanOutline {
            steps: vec![RecoveryStep::new("full_restart", 2000)
                .param("reason", json!("no recovery checkpoint available"))],
            success_probability: 0.6,
            checkpoint_ids: Vec::new(),
        },
    }
}

/// Node ids listed under `failed_nodes`; non-string entries are skipped.
fn failed_nodes(failure_context: &Value) -> Vec<&str> {
    failure_context
        .get("failed_nodes")
        .and_then(Value::as_array)
        .map(|nodes| nodes.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn partial_retry_outline(failure_context: &Value) -> PlanOutline {
    PlanOutline {
        steps: failed_nodes(failure_context)
            .into_iter()
            .map(|node| RecoveryStep::new("retry_node", 800).param("node_id", json!(node)))
            .collect(),
        success_probability: 0.7,
        checkpoint_ids: Vec::new(),
    }
}

fn compensating_outline() -> PlanOutline {
    PlanOutline {
        steps: vec![
            RecoveryStep::new("execute_compensation", 1500),
            RecoveryStep::new("clean_partial_state", 800),
        ],
        success_probability: 0.75,
        checkpoint_ids: Vec::new(),
    }
}

fn abort_outline() -> PlanOutline {
    PlanOutline {
        steps: vec![RecoveryStep::new("abort_workflow", 500).param("cleanup", json!(true))],
        success_probability: 1.0,
        checkpoint_ids: Vec::new(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Plans kept for audit across all workflows; the oldest are evicted
    /// first. Values below one are treated as one.
    pub max_plans: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { max_plans: 1000 }
    }
}

#[derive(Default)]
struct PlanLog {
    plans: HashMap<Uuid, RecoveryPlan>,
    /// Plan ids, oldest first.
    order: VecDeque<Uuid>,
}

impl PlanLog {
    fn evict_oldest(&mut self) -> bool {
        match self.order.pop_front() {
            Some(id) => {
                self.plans.remove(&id);
                true
            }
            None => false,
        }
    }
}

/// Builds recovery plans from checkpoint store contents and ledger state.
pub struct RecoveryPlanner {
    store: Arc<CheckpointStore>,
    ledger: Arc<TransitionLedger>,
    config: PlannerConfig,
    log: Mutex<PlanLog>,
}

impl RecoveryPlanner {
    pub fn new(store: Arc<CheckpointStore>, ledger: Arc<TransitionLedger>) -> Self {
        Self::with_config(store, ledger, PlannerConfig::default())
    }

    pub fn with_config(
        store: Arc<CheckpointStore>,
        ledger: Arc<TransitionLedger>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            config,
            log: Mutex::new(PlanLog::default()),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CheckpointStore> {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<TransitionLedger> {
        &self.ledger
    }

    /// Generate and record a plan. Always returns a plan; an unrecognized
    /// strategy yields the abort plan.
    pub fn generate_recovery_plan(
        &self,
        workflow_id: &str,
        failure_context: Value,
        strategy: impl Into<RecoveryStrategy>,
    ) -> RecoveryPlan {
        let strategy = strategy.into();

        let outline = match strategy {
            RecoveryStrategy::CheckpointRollback => {
                let recovery_points = self.store.get_recovery_checkpoints(workflow_id);
                let latest = recovery_points.iter().max_by_key(|cp| cp.timestamp);
                rollback_outline(latest)
            }
            RecoveryStrategy::PartialRetry => partial_retry_outline(&failure_context),
            RecoveryStrategy::CompensatingActions => compensating_outline(),
            RecoveryStrategy::Abort => abort_outline(),
        };

        let plan = RecoveryPlan {
            id: Uuid::new_v4(),
            workflow_id: workflow_id.to_string(),
            total_estimated_ms: outline.steps.iter().map(|s| s.estimated_duration_ms).sum(),
            failure_context,
            strategy,
            steps: outline.steps,
            success_probability: outline.success_probability,
            checkpoint_ids: outline.checkpoint_ids,
            workflow_state_at_failure: self.ledger.current_state(workflow_id),
            created_at: Utc::now(),
        };

        tracing::info!(
            workflow_id,
            plan_id = %plan.id,
            strategy = %strategy,
            steps = plan.steps.len(),
            total_estimated_ms = plan.total_estimated_ms,
            "Generated recovery plan"
        );
        if plan.success_probability < LOW_CONFIDENCE_THRESHOLD {
            tracing::warn!(
                workflow_id,
                plan_id = %plan.id,
                success_probability = plan.success_probability,
                "Low-confidence recovery plan"
            );
        }

        self.record(plan.clone());
        plan
    }

    fn record(&self, plan: RecoveryPlan) {
        let capacity = self.config.max_plans.max(1);
        let mut log = self.log.lock();
        log.order.push_back(plan.id);
        log.plans.insert(plan.id, plan);
        while log.order.len() > capacity && log.evict_oldest() {
            tracing::debug!(capacity, "Evicted oldest recovery plan");
        }
    }

    pub fn get_plan(&self, id: &Uuid) -> Option<RecoveryPlan> {
        self.log.lock().plans.get(id).cloned()
    }

    /// Plans generated for a workflow, oldest first.
    pub fn plans_for_workflow(&self, workflow_id: &str) -> Vec<RecoveryPlan> {
        let log = self.log.lock();
        log.order
            .iter()
            .filter_map(|id| log.plans.get(id))
            .filter(|plan| plan.workflow_id == workflow_id)
            .cloned()
            .collect()
    }

    pub fn plan_count(&self) -> usize {
        self.log.lock().plans.len()
    }

    /// Keep only the newest `keep_last` plans. Returns how many were dropped.
    pub fn prune_plans(&self, keep_last: usize) -> usize {
        let mut log = self.log.lock();
        let mut removed = 0;
        while log.order.len() > keep_last && log.evict_oldest() {
            removed += 1;
        }
        if removed > 0 {
            tracing::info!(removed, keep_last, "Pruned recovery plans");
        }
        removed
    }

    /// Drop every plan recorded for a workflow. Returns how many were dropped.
    pub fn remove_plans_for(&self, workflow_id: &str) -> usize {
        let mut log = self.log.lock();
        let PlanLog { plans, order } = &mut *log;
        let before = order.len();
        order.retain(|id| match plans.get(id) {
            Some(plan) if plan.workflow_id == workflow_id => {
                plans.remove(id);
                false
            }
            _ => true,
        });
        before - order.len()
    }
}
