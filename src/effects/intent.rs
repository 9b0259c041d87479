//! Intent records describing side effects for external collaborators.
//!
//! The engine never performs a side effect itself. A successful transition
//! yields an ordered list of intents: exit actions of the old state, entry
//! actions of the new state, then exactly one `persist_state` and one
//! `record_metric` intent.

use crate::contract::{FsmStateDefinition, FsmTransitionDefinition};
use crate::core::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Collaborator that dispatches state actions and custom intents.
pub const ACTION_DISPATCHER: &str = "action_dispatcher";
/// Collaborator that persists FSM state.
pub const STATE_PERSISTENCE: &str = "state_persistence";
/// Collaborator that records metrics.
pub const METRICS_PIPELINE: &str = "metrics_pipeline";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    FsmStateAction,
    PersistState,
    RecordMetric,
    Custom,
}

/// Phase in which a state action runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPhase {
    Exit,
    Entry,
}

/// One side effect for an external collaborator to perform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent_type: IntentType,
    pub target: String,
    pub payload: Value,
}

impl Intent {
    pub fn state_action(
        action: &str,
        phase: ActionPhase,
        state: &str,
        transition: &FsmTransitionDefinition,
    ) -> Self {
        Self {
            intent_type: IntentType::FsmStateAction,
            target: ACTION_DISPATCHER.to_string(),
            payload: json!({
                "action_name": action,
                "phase": phase,
                "state": state,
                "transition": transition.name,
                "from_state": transition.from_state,
                "to_state": transition.to_state,
            }),
        }
    }

    /// Free-form intent routed to the generic dispatcher.
    pub fn custom(target: impl Into<String>, payload: Value) -> Self {
        Self {
            intent_type: IntentType::Custom,
            target: target.into(),
            payload,
        }
    }
}

/// Build the ordered intents for one successful transition. Pure.
///
/// # Example
///
/// ```rust
/// use fsm_reducer::contract::{FsmStateDefinition, FsmTransitionDefinition};
/// use fsm_reducer::core::Context;
/// use fsm_reducer::effects::{emit_transition_intents, IntentType};
///
/// let idle = FsmStateDefinition::new("idle").on_exit("release");
/// let busy = FsmStateDefinition::new("busy").on_entry("acquire");
/// let t = FsmTransitionDefinition::new("start", "idle", "busy", "start");
///
/// let intents = emit_transition_intents(&idle, &busy, &t, &Context::new());
/// let kinds: Vec<IntentType> = intents.iter().map(|i| i.intent_type).collect();
/// assert_eq!(
///     kinds,
///     vec![
///         IntentType::FsmStateAction,
///         IntentType::FsmStateAction,
///         IntentType::PersistState,
///         IntentType::RecordMetric,
///     ]
/// );
/// ```
pub fn emit_transition_intents(
    old_state: &FsmStateDefinition,
    new_state: &FsmStateDefinition,
    transition: &FsmTransitionDefinition,
    context: &Context,
) -> Vec<Intent> {
    let exits = old_state
        .exit_actions
        .iter()
        .map(|a| Intent::state_action(a, ActionPhase::Exit, &old_state.name, transition));
    let entries = new_state
        .entry_actions
        .iter()
        .map(|a| Intent::state_action(a, ActionPhase::Entry, &new_state.name, transition));

    let mut intents: Vec<Intent> = exits.chain(entries).collect();

    intents.push(Intent {
        intent_type: IntentType::PersistState,
        target: STATE_PERSISTENCE.to_string(),
        payload: json!({
            "from_state": old_state.name,
            "to_state": new_state.name,
            "transition": transition.name,
            "trigger": transition.trigger,
            "is_terminal": new_state.is_terminal,
            "context": context,
        }),
    });

    intents.push(Intent {
        intent_type: IntentType::RecordMetric,
        target: METRICS_PIPELINE.to_string(),
        payload: json!({
            "metric_name": "fsm_transition",
            "value": 1,
            "labels": {
                "transition": transition.name,
                "from_state": old_state.name,
                "to_state": new_state.name,
                "trigger": transition.trigger,
            },
        }),
    });

    intents
}
