//! Checkpoint Rollback
//!
//! This example drives a reducer through its contract, records a recovery
//! point, fails the workflow and rolls the reducer back using a plan from
//! the recovery planner.
//!
//! Key concepts:
//! - Executor snapshots stored as checkpoint node state
//! - Lifecycle tracking in the transition ledger
//! - Recovery plans that reference the newest recovery point
//! - Restoring an executor from a checkpointed snapshot
//!
//! Run with: cargo run --example checkpoint_rollback

use fsm_reducer::builder::{ContractBuilder, TransitionBuilder};
use fsm_reducer::checkpoint::{CheckpointRequest, CheckpointStore};
use fsm_reducer::contract::{FsmStateDefinition, FsmSubcontract};
use fsm_reducer::effects::{FsmExecutor, ReductionInput};
use fsm_reducer::workflow::{RecoveryPlanner, TransitionLedger, WorkflowState};
use serde_json::json;
use std::error::Error;
use std::sync::Arc;

const WORKFLOW: &str = "nightly-aggregation";
const NODE: &str = "aggregator";

fn aggregation_contract() -> Result<FsmSubcontract, Box<dyn Error>> {
    let contract = ContractBuilder::new("aggregator", "1.0.0")
        .initial("idle")
        .state(FsmStateDefinition::new("idle"))
        .state(FsmStateDefinition::new("collecting").on_entry("open_batch"))
        .state(FsmStateDefinition::new("reducing"))
        .state(FsmStateDefinition::terminal("published"))
        .transition(TransitionBuilder::new().from("idle").to("collecting").on("start"))?
        .transition(TransitionBuilder::new().from("collecting").to("reducing").on("flush"))?
        .transition(TransitionBuilder::new().from("reducing").to("published").on("publish"))?
        .build()?;
    Ok(contract)
}

fn step(executor: &FsmExecutor, trigger: &str) -> Result<(), Box<dyn Error>> {
    let from = executor.get_current_state();
    let output = executor.process(&ReductionInput::trigger(trigger))?;
    println!(
        "  {} --{}--> {} ({} intents)",
        from,
        trigger,
        output.fsm_state(),
        output.intents.len()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== Checkpoint Rollback Example ===\n");

    let store = Arc::new(CheckpointStore::default());
    let ledger = Arc::new(TransitionLedger::default());
    let planner = RecoveryPlanner::new(store.clone(), ledger.clone());
    let executor = FsmExecutor::new(aggregation_contract()?)?;

    // Run until the reducer is mid-workflow
    println!("Run 1: Processing");
    println!("----------------------------------------");
    ledger.initialize_workflow_state(WORKFLOW, WorkflowState::Pending);
    ledger.transition_workflow_state(WORKFLOW, WorkflowState::Running, "start", None);
    step(&executor, "start")?;
    step(&executor, "flush")?;

    let checkpoint_id = store.create_checkpoint(
        CheckpointRequest::new(WORKFLOW, "after-flush")
            .workflow_state(json!({ "phase": "reducing" }))
            .node_snapshot(NODE, &executor.snapshot_state())?
            .recovery_point(true),
    );
    println!("  [Checkpoint] {} saved at '{}'", checkpoint_id, executor.get_current_state());

    // Publishing fails downstream after the reducer already moved on
    step(&executor, "publish")?;
    ledger.transition_workflow_state(
        WORKFLOW,
        WorkflowState::Failed,
        "publish_failed",
        Some(json!({ "error": "sink unavailable" })),
    );
    println!("\n  [FAILURE] Sink unavailable, workflow marked FAILED\n");

    // Plan the recovery
    println!("Run 2: Recovery");
    println!("----------------------------------------");
    let plan = planner.generate_recovery_plan(
        WORKFLOW,
        json!({ "error": "sink unavailable" }),
        "checkpoint_rollback",
    );
    println!(
        "  Plan {} ({}, p={:.2}, ~{}ms)",
        plan.id, plan.strategy, plan.success_probability, plan.total_estimated_ms
    );
    for action in &plan.steps {
        println!("    - {} ({}ms)", action.name, action.estimated_duration_ms);
    }

    // Restore the reducer from the checkpoint the plan references
    let Some(checkpoint) = plan
        .checkpoint_ids
        .first()
        .and_then(|id| store.get_checkpoint(id))
    else {
        println!("  No recovery point available; a full restart is required");
        return Ok(());
    };
    if let Some(snapshot) = checkpoint.node_snapshot(NODE)? {
        executor.restore_state(snapshot)?;
    }
    println!(
        "  Restored '{}' from checkpoint '{}', history {:?}",
        executor.get_current_state(),
        checkpoint.name,
        executor.get_state_history()
    );

    ledger.transition_workflow_state(WORKFLOW, WorkflowState::Running, "retry", None);
    step(&executor, "publish")?;
    ledger.transition_workflow_state(WORKFLOW, WorkflowState::Completed, "published", None);
    println!("\nWorkflow state: {:?}", ledger.current_state(WORKFLOW));

    println!("\nKey Takeaways:");
    println!("- Executor snapshots are plain serde values inside a checkpoint");
    println!("- The ledger records the failure the planner reports against");
    println!("- Rollback plans point at the newest recovery checkpoint");
    println!("- Restoring replaces the executor snapshot wholesale");

    println!("\n=== Example Complete ===");
    Ok(())
}
