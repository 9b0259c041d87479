//! Property-based tests for the executor, checkpoint store, planner and
//! ledger.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use fsm_reducer::builder::linear_contract;
use fsm_reducer::checkpoint::{CheckpointRequest, CheckpointStore};
use fsm_reducer::core::{ConditionEvaluator, Context};
use fsm_reducer::effects::{FsmExecutor, ReductionInput};
use fsm_reducer::workflow::{RecoveryPlanner, TransitionLedger, WorkflowState};
use fsm_reducer::ErrorCode;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

const TRIGGER: &str = "next";

fn state_names(len: usize) -> Vec<String> {
    (0..len).map(|i| format!("s{i}")).collect()
}

fn linear_executor(len: usize) -> FsmExecutor {
    let names = state_names(len);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let contract = linear_contract("prop", &refs, TRIGGER).unwrap();
    FsmExecutor::new(contract).unwrap()
}

prop_compose! {
    fn arbitrary_workflow_state()(index in 0..WorkflowState::ALL.len()) -> WorkflowState {
        WorkflowState::ALL[index]
    }
}

fn allowed(from: WorkflowState, to: WorkflowState) -> bool {
    use WorkflowState::*;
    let table: &[(WorkflowState, &[WorkflowState])] = &[
        (Pending, &[Running, Cancelled]),
        (Running, &[Completed, Failed, Cancelled]),
        (Failed, &[Running, Cancelled]),
        (Simulated, &[Running, Completed]),
    ];
    table
        .iter()
        .any(|(source, targets)| *source == from && targets.contains(&to))
}

proptest! {
    #[test]
    fn fresh_executor_starts_at_initial_state(len in 2usize..8) {
        let executor = linear_executor(len);
        prop_assert_eq!(executor.get_current_state(), "s0");
        prop_assert!(executor.get_state_history().is_empty());
        prop_assert!(!executor.is_complete());
    }

    #[test]
    fn each_success_appends_exactly_one_history_entry(len in 2usize..8, steps in 0usize..8) {
        let executor = linear_executor(len);
        let steps = steps.min(len - 1);

        for step in 0..steps {
            let before = executor.get_state_history().len();
            let output = executor.process(&ReductionInput::trigger(TRIGGER)).unwrap();

            prop_assert!(output.fsm_success());
            let expected = format!("s{}", step + 1);
            prop_assert_eq!(output.fsm_state(), expected.as_str());
            prop_assert_eq!(executor.get_current_state(), expected);
            prop_assert_eq!(executor.get_state_history().len(), before + 1);
        }
        prop_assert_eq!(executor.get_state_history(), state_names(steps));
    }

    #[test]
    fn terminal_state_rejects_every_trigger(len in 2usize..6, trigger in "[a-z_]{0,10}") {
        let executor = linear_executor(len);
        for _ in 0..len - 1 {
            executor.process(&ReductionInput::trigger(TRIGGER)).unwrap();
        }
        prop_assert!(executor.is_complete());
        let before = executor.snapshot_state();

        let first = executor.process(&ReductionInput::trigger(&trigger));
        let second = executor.process(&ReductionInput::trigger(&trigger));

        prop_assert!(first.is_err());
        prop_assert_eq!(first.unwrap_err(), second.unwrap_err());
        prop_assert_eq!(executor.snapshot_state(), before);
    }

    #[test]
    fn unknown_trigger_is_structural(trigger in "[a-z]{1,10}") {
        prop_assume!(trigger != TRIGGER);
        let executor = linear_executor(3);

        let err = executor.process(&ReductionInput::trigger(&trigger)).unwrap_err();
        prop_assert_eq!(err.code, ErrorCode::UnknownTrigger);
        prop_assert_eq!(executor.get_current_state(), "s0");
    }

    #[test]
    fn snapshot_then_restore_is_identity(len in 2usize..8, steps in 0usize..8, later in 0usize..8) {
        let executor = linear_executor(len);
        let steps = steps.min(len - 1);
        for _ in 0..steps {
            executor.process(&ReductionInput::trigger(TRIGGER)).unwrap();
        }
        let snapshot = executor.snapshot_state();

        for _ in 0..later {
            let _ = executor.process(&ReductionInput::trigger(TRIGGER));
        }
        executor.restore_state(snapshot.clone()).unwrap();

        prop_assert_eq!(executor.get_current_state(), snapshot.current_state.clone());
        prop_assert_eq!(executor.get_state_history(), snapshot.history.clone());
    }

    #[test]
    fn overflowing_store_evicts_exactly_the_oldest(max in 1usize..12) {
        let store = CheckpointStore::with_max_checkpoints(max);
        let ids: Vec<_> = (0..=max)
            .map(|i| store.create_checkpoint(CheckpointRequest::new("wf", &format!("c{i}"))))
            .collect();

        let kept = store.get_checkpoints("wf");
        prop_assert_eq!(kept.len(), max);
        prop_assert!(store.get_checkpoint(&ids[0]).is_none());
        let kept_ids: Vec<_> = kept.iter().map(|cp| cp.id).collect();
        prop_assert_eq!(kept_ids, ids[1..].to_vec());
        prop_assert!(kept.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
    }

    #[test]
    fn recovery_plans_are_deterministic(
        strategy in prop_oneof![
            Just("checkpoint_rollback".to_string()),
            Just("partial_retry".to_string()),
            Just("compensating_actions".to_string()),
            Just("abort".to_string()),
            "[a-z]{3,8}",
        ],
        recovery_points in 0usize..3,
        failed in proptest::collection::vec("[a-z]{1,6}", 0..4),
    ) {
        let store = Arc::new(CheckpointStore::default());
        for i in 0..recovery_points {
            store.create_checkpoint(
                CheckpointRequest::new("wf", &format!("rp{i}")).recovery_point(true),
            );
        }
        let planner = RecoveryPlanner::new(store, Arc::new(TransitionLedger::default()));
        let context = json!({ "failed_nodes": failed });

        let first = planner.generate_recovery_plan("wf", context.clone(), strategy.as_str());
        let second = planner.generate_recovery_plan("wf", context, strategy.as_str());

        prop_assert_eq!(first.strategy, second.strategy);
        prop_assert_eq!(first.steps.len(), second.steps.len());
        prop_assert_eq!(first.total_estimated_ms, second.total_estimated_ms);
        prop_assert_eq!(first.checkpoint_ids, second.checkpoint_ids);
        prop_assert_eq!(
            first.total_estimated_ms,
            first.steps.iter().map(|s| s.estimated_duration_ms).sum::<u64>()
        );
    }

    #[test]
    fn ledger_follows_lifecycle_table(
        from in arbitrary_workflow_state(),
        to in arbitrary_workflow_state(),
    ) {
        let ledger = TransitionLedger::default();
        ledger.initialize_workflow_state("wf", from);

        let accepted = ledger.transition_workflow_state("wf", to, "prop", None);
        let history = ledger.get_state_history("wf");

        prop_assert_eq!(accepted, allowed(from, to));
        prop_assert_eq!(history.len(), 1);
        prop_assert_eq!(history[0].is_valid, accepted);
        let expected = if accepted { to } else { from };
        prop_assert_eq!(ledger.current_state("wf"), Some(expected));
    }

    #[test]
    fn condition_evaluation_never_panics(expression in ".{0,40}", value in "[a-z0-9]{0,6}") {
        let evaluator = ConditionEvaluator::default();
        let mut context = Context::new();
        context.insert("status".to_string(), json!(value));

        let first = evaluator.evaluate(&expression, &context);
        prop_assert_eq!(first, evaluator.evaluate(&expression, &context));
    }
}
