//! Read-only aggregates over ledger records and stored checkpoints.

use super::ledger::{StateTransitionRecord, TransitionLedger};
use super::state::WorkflowState;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateAnalytics {
    pub total_transitions: usize,
    pub valid_transitions: usize,
    pub invalid_transitions: usize,
    /// `invalid / total`, zero when nothing was recorded.
    pub invalid_transition_ratio: f64,
    /// How often each state was entered by a valid transition.
    pub state_distribution: BTreeMap<WorkflowState, usize>,
    /// Mean gap between consecutive valid transitions of the same workflow.
    pub mean_transition_latency_ms: Option<f64>,
}

impl StateAnalytics {
    pub fn from_records(records: &[StateTransitionRecord]) -> Self {
        let total_transitions = records.len();
        let valid: Vec<&StateTransitionRecord> = records.iter().filter(|r| r.is_valid).collect();
        let valid_transitions = valid.len();
        let invalid_transitions = total_transitions - valid_transitions;

        let invalid_transition_ratio = if total_transitions == 0 {
            0.0
        } else {
            invalid_transitions as f64 / total_transitions as f64
        };

        let mut state_distribution = BTreeMap::new();
        for record in &valid {
            *state_distribution.entry(record.to_state).or_insert(0) += 1;
        }

        let mut per_workflow: BTreeMap<&str, Vec<DateTime<Utc>>> = BTreeMap::new();
        for record in &valid {
            per_workflow
                .entry(record.workflow_id.as_str())
                .or_default()
                .push(record.timestamp);
        }
        let gaps: Vec<f64> = per_workflow
            .values_mut()
            .flat_map(|stamps| {
                stamps.sort();
                stamps
                    .windows(2)
                    .map(|pair| {
                        let micros = (pair[1] - pair[0]).num_microseconds().unwrap_or(i64::MAX);
                        micros as f64 / 1000.0
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        let mean_transition_latency_ms =
            (!gaps.is_empty()).then(|| gaps.iter().sum::<f64>() / gaps.len() as f64);

        Self {
            total_transitions,
            valid_transitions,
            invalid_transitions,
            invalid_transition_ratio,
            state_distribution,
            mean_transition_latency_ms,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointAnalytics {
    pub total_checkpoints: usize,
    pub recovery_points: usize,
    pub workflows: usize,
    pub avg_per_workflow: f64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

impl CheckpointAnalytics {
    pub fn from_checkpoints(checkpoints: &[Checkpoint]) -> Self {
        let workflows = checkpoints
            .iter()
            .map(|cp| cp.workflow_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let total_checkpoints = checkpoints.len();

        Self {
            total_checkpoints,
            recovery_points: checkpoints.iter().filter(|cp| cp.is_recovery_point).count(),
            workflows,
            avg_per_workflow: if workflows == 0 {
                0.0
            } else {
                total_checkpoints as f64 / workflows as f64
            },
            oldest: checkpoints.iter().map(|cp| cp.timestamp).min(),
            newest: checkpoints.iter().map(|cp| cp.timestamp).max(),
        }
    }
}

/// Combined view used by operators deciding whether recovery is viable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryAnalytics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    pub states: StateAnalytics,
    pub checkpoints: CheckpointAnalytics,
}

impl RecoveryAnalytics {
    /// Collect analytics for one workflow, or globally with `None`.
    pub fn collect(
        ledger: &TransitionLedger,
        store: &CheckpointStore,
        workflow_id: Option<&str>,
    ) -> Self {
        let checkpoints = match workflow_id {
            Some(wf) => store.get_checkpoints(wf),
            None => store.all_checkpoints(),
        };
        Self {
            workflow_id: workflow_id.map(str::to_string),
            states: ledger.get_state_analytics(workflow_id),
            checkpoints: CheckpointAnalytics::from_checkpoints(&checkpoints),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointRequest;
    use chrono::Duration;

    fn record(
        workflow: &str,
        to: WorkflowState,
        valid: bool,
        at: DateTime<Utc>,
    ) -> StateTransitionRecord {
        StateTransitionRecord {
            workflow_id: workflow.to_string(),
            from_state: None,
            to_state: to,
            trigger_event: "test".to_string(),
            timestamp: at,
            is_valid: valid,
            error: None,
            context: None,
        }
    }

    #[test]
    fn empty_records_give_zeroed_analytics() {
        let analytics = StateAnalytics::from_records(&[]);
        assert_eq!(analytics.total_transitions, 0);
        assert_eq!(analytics.invalid_transition_ratio, 0.0);
        assert_eq!(analytics.mean_transition_latency_ms, None);
    }

    #[test]
    fn ratio_distribution_and_latency() {
        let t0 = Utc::now();
        let records = vec![
            record("a", WorkflowState::Running, true, t0),
            record("a", WorkflowState::Failed, true, t0 + Duration::milliseconds(100)),
            record("a", WorkflowState::Completed, false, t0 + Duration::milliseconds(150)),
            record("a", WorkflowState::Running, true, t0 + Duration::milliseconds(400)),
            record("b", WorkflowState::Running, true, t0 + Duration::seconds(60)),
        ];

        let analytics = StateAnalytics::from_records(&records);

        assert_eq!(analytics.total_transitions, 5);
        assert_eq!(analytics.valid_transitions, 4);
        assert_eq!(analytics.invalid_transitions, 1);
        assert!((analytics.invalid_transition_ratio - 0.2).abs() < 1e-9);
        assert_eq!(analytics.state_distribution[&WorkflowState::Running], 3);
        assert_eq!(analytics.state_distribution[&WorkflowState::Failed], 1);
        assert!(!analytics.state_distribution.contains_key(&WorkflowState::Completed));
        // gaps within "a": 100ms and 300ms; "b" has a single record
        assert_eq!(analytics.mean_transition_latency_ms, Some(200.0));
    }

    #[test]
    fn checkpoint_analytics() {
        let store = CheckpointStore::default();
        let t0 = Utc::now();
        store.create_checkpoint_at(CheckpointRequest::new("a", "1"), t0);
        store.create_checkpoint_at(
            CheckpointRequest::new("a", "2").recovery_point(true),
            t0 + Duration::seconds(1),
        );
        store.create_checkpoint_at(CheckpointRequest::new("b", "1"), t0 + Duration::seconds(2));

        let analytics = CheckpointAnalytics::from_checkpoints(&store.all_checkpoints());
        assert_eq!(analytics.total_checkpoints, 3);
        assert_eq!(analytics.recovery_points, 1);
        assert_eq!(analytics.workflows, 2);
        assert!((analytics.avg_per_workflow - 1.5).abs() < 1e-9);
        assert_eq!(analytics.oldest, Some(t0));
        assert_eq!(analytics.newest, Some(t0 + Duration::seconds(2)));
    }

    #[test]
    fn collect_scopes_both_sources() {
        let ledger = TransitionLedger::default();
        let store = CheckpointStore::default();
        ledger.initialize_workflow_state("a", WorkflowState::Pending);
        ledger.transition_workflow_state("a", WorkflowState::Running, "start", None);
        store.create_checkpoint(CheckpointRequest::new("a", "cp"));
        store.create_checkpoint(CheckpointRequest::new("b", "cp"));

        let scoped = RecoveryAnalytics::collect(&ledger, &store, Some("a"));
        assert_eq!(scoped.workflow_id.as_deref(), Some("a"));
        assert_eq!(scoped.states.total_transitions, 1);
        assert_eq!(scoped.checkpoints.total_checkpoints, 1);

        let global = RecoveryAnalytics::collect(&ledger, &store, None);
        assert_eq!(global.checkpoints.total_checkpoints, 2);
        assert_eq!(global.checkpoints.workflows, 2);
    }
}
