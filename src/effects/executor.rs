//! Contract-driven FSM executor for one reducer instance.

use super::intent::emit_transition_intents;
use super::reduction::{OutputMetadata, ReductionInput, ReductionOutput};
use crate::contract::{FsmStateDefinition, FsmSubcontract, FsmTransitionDefinition};
use crate::core::{ConditionEvaluator, Context, FsmRuntimeSnapshot};
use crate::enforcement::{enforce_guards, GuardReport};
use crate::error::{ErrorCode, Result, ValidationError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Executor tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Visited states kept in the runtime snapshot; oldest dropped first.
    pub max_history: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

/// Capability a reducer exposes to be driven by an [`FsmExecutor`].
///
/// The executor's output becomes the reducer's next state; the reducer
/// only supplies where to start.
pub trait Reducer {
    fn initial_state(&self) -> FsmRuntimeSnapshot;
}

/// Drives one runtime snapshot through a contract.
///
/// `process` calls must be serialized by the caller. Read-only queries may
/// run concurrently and observe a consistent snapshot: the snapshot is
/// replaced wholesale, never mutated in place.
#[derive(Debug)]
pub struct FsmExecutor {
    contract: FsmSubcontract,
    evaluator: ConditionEvaluator,
    config: ExecutorConfig,
    snapshot: RwLock<Arc<FsmRuntimeSnapshot>>,
}

impl FsmExecutor {
    /// Create an executor in the contract's initial state.
    /// Fails if the contract is structurally invalid.
    pub fn new(contract: FsmSubcontract) -> Result<Self> {
        Self::with_config(contract, ExecutorConfig::default())
    }

    pub fn with_config(contract: FsmSubcontract, config: ExecutorConfig) -> Result<Self> {
        contract.validate()?;
        let snapshot = FsmRuntimeSnapshot::new(contract.initial_state.clone());
        Ok(Self {
            contract,
            evaluator: ConditionEvaluator::default(),
            config,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Create an executor seeded from a reducer's initial state.
    pub fn for_reducer<R: Reducer>(contract: FsmSubcontract, reducer: &R) -> Result<Self> {
        let executor = Self::new(contract)?;
        executor.restore_state(reducer.initial_state())?;
        Ok(executor)
    }

    /// Replace the condition evaluator (e.g. one with custom predicates).
    pub fn with_evaluator(mut self, evaluator: ConditionEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Seed the runtime context.
    pub fn with_context(self, context: Context) -> Self {
        let next = self.snapshot_state().with_context(context);
        *self.snapshot.write() = Arc::new(next);
        self
    }

    pub fn contract(&self) -> &FsmSubcontract {
        &self.contract
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn get_current_state(&self) -> String {
        self.snapshot.read().current_state.clone()
    }

    pub fn get_state_history(&self) -> Vec<String> {
        self.snapshot.read().history.clone()
    }

    /// Whether the current state is terminal.
    pub fn is_complete(&self) -> bool {
        let snapshot = self.shared_snapshot();
        self.contract.is_terminal(&snapshot.current_state)
    }

    /// Triggers accepted from the current state, in declaration order.
    pub fn available_triggers(&self) -> Vec<String> {
        let snapshot = self.shared_snapshot();
        let mut triggers: Vec<String> = Vec::new();
        for t in self.contract.transitions_from(&snapshot.current_state) {
            if !triggers.contains(&t.trigger) {
                triggers.push(t.trigger.clone());
            }
        }
        triggers
    }

    /// Independent copy of the runtime snapshot.
    pub fn snapshot_state(&self) -> FsmRuntimeSnapshot {
        (**self.snapshot.read()).clone()
    }

    /// The current snapshot, shared rather than copied.
    pub fn shared_snapshot(&self) -> Arc<FsmRuntimeSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Replace the runtime snapshot wholesale.
    ///
    /// Fails if the snapshot's current state is not declared by the contract;
    /// the existing snapshot is kept in that case.
    pub fn restore_state(&self, snapshot: FsmRuntimeSnapshot) -> Result<()> {
        if !self.contract.has_state(&snapshot.current_state) {
            return Err(ValidationError::new(
                ErrorCode::UndeclaredState,
                format!(
                    "cannot restore into state '{}': not declared by contract '{}'",
                    snapshot.current_state, self.contract.name
                ),
            )
            .with("contract", self.contract.name.clone())
            .with("to_state", snapshot.current_state.clone()));
        }

        tracing::debug!(
            contract = %self.contract.name,
            state = %snapshot.current_state,
            history_len = snapshot.history.len(),
            "Restored FSM snapshot"
        );
        *self.snapshot.write() = Arc::new(snapshot);
        Ok(())
    }

    /// Apply one reduction input.
    ///
    /// Structural problems (missing trigger, no transition for the trigger
    /// from the current state) fail with a [`ValidationError`] and leave the
    /// snapshot untouched. A transition blocked by a required guard is not an
    /// error: the output reports `fsm_success = false` with no intents.
    ///
    /// History is bounded by [`ExecutorConfig::max_history`] (100 by
    /// default); once full, each transition drops the oldest entry.
    pub fn process(&self, input: &ReductionInput) -> Result<ReductionOutput> {
        let started = Instant::now();
        let snapshot = self.shared_snapshot();
        let from = snapshot.current_state.as_str();

        let trigger = input
            .metadata
            .trigger
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ValidationError::new(ErrorCode::MissingTrigger, "reduction input has no trigger")
                    .with("contract", self.contract.name.clone())
                    .with("from_state", from)
            })?;

        let Some(transition) = self.contract.find_transition(from, trigger) else {
            let mut err = ValidationError::new(
                ErrorCode::UnknownTrigger,
                format!("no transition from '{from}' on trigger '{trigger}'"),
            )
            .with("contract", self.contract.name.clone())
            .with("trigger", trigger)
            .with("from_state", from);
            if self.contract.is_terminal(from) {
                err = err.with("terminal", "true");
            }
            tracing::debug!(contract = %self.contract.name, from, trigger, "Rejected unknown trigger");
            return Err(err);
        };

        let mut guard_context = snapshot.context.clone();
        for (key, value) in &input.metadata.extensions {
            guard_context.insert(key.clone(), value.clone());
        }

        let report = enforce_guards(transition, &guard_context, &self.evaluator);
        if report.is_blocked() {
            tracing::warn!(
                contract = %self.contract.name,
                transition = %transition.name,
                from,
                trigger,
                violations = report.violations.len(),
                "Transition blocked by guard"
            );
            return Ok(self.blocked_output(input, &snapshot, transition, &report, started));
        }

        let old_def = self.declared_state(from, transition)?;
        let new_def = self.declared_state(&transition.to_state, transition)?;

        let next = snapshot.advance(transition.to_state.clone(), self.config.max_history);
        let intents = emit_transition_intents(old_def, new_def, transition, &next.context);

        tracing::debug!(
            contract = %self.contract.name,
            transition = %transition.name,
            from,
            to = %transition.to_state,
            intents = intents.len(),
            "FSM transition"
        );

        *self.snapshot.write() = Arc::new(next);

        Ok(ReductionOutput {
            operation_id: input.operation_id,
            reduction_type: input.reduction_type,
            items_processed: input.items.len(),
            batches_processed: input.batch_count(),
            streaming_mode: input.streaming_mode,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            intents,
            metadata: self.output_metadata(input, transition, true, &transition.to_state, Some(from)),
            result: json!({
                "transition": transition.name,
                "from_state": from,
                "to_state": transition.to_state,
                "conditions": report.outcomes,
            }),
        })
    }

    fn declared_state(
        &self,
        name: &str,
        transition: &FsmTransitionDefinition,
    ) -> Result<&FsmStateDefinition> {
        self.contract.state(name).ok_or_else(|| {
            ValidationError::new(
                ErrorCode::UndeclaredState,
                format!("state '{name}' is not declared"),
            )
            .with("contract", self.contract.name.clone())
            .with("trigger", transition.trigger.clone())
            .with("from_state", transition.from_state.clone())
            .with("to_state", transition.to_state.clone())
        })
    }

    fn output_metadata(
        &self,
        input: &ReductionInput,
        transition: &FsmTransitionDefinition,
        success: bool,
        state: &str,
        previous: Option<&str>,
    ) -> OutputMetadata {
        OutputMetadata {
            fsm_state: state.to_string(),
            fsm_success: success,
            trigger: transition.trigger.clone(),
            transition: Some(transition.name.clone()),
            previous_state: previous.map(str::to_string),
            source: input.metadata.source.clone(),
            correlation_id: input.metadata.correlation_id,
            tags: input.metadata.tags.clone(),
        }
    }

    fn blocked_output(
        &self,
        input: &ReductionInput,
        snapshot: &FsmRuntimeSnapshot,
        transition: &FsmTransitionDefinition,
        report: &GuardReport,
        started: Instant,
    ) -> ReductionOutput {
        ReductionOutput {
            operation_id: input.operation_id,
            reduction_type: input.reduction_type,
            items_processed: input.items.len(),
            batches_processed: input.batch_count(),
            streaming_mode: input.streaming_mode,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            intents: Vec::new(),
            metadata: self.output_metadata(
                input,
                transition,
                false,
                &snapshot.current_state,
                snapshot.previous_state(),
            ),
            result: json!({
                "blocked": true,
                "transition": transition.name,
                "from_state": snapshot.current_state,
                "to_state": transition.to_state,
                "violations": report.violations,
                "conditions": report.outcomes,
            }),
        }
    }
}
