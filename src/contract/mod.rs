//! Declarative FSM contract.
//!
//! A contract is produced by an external loader (or by [`crate::builder`]),
//! validated once, and never mutated afterwards. Guard expressions are parsed
//! into [`Condition`] values as the contract is built or deserialized.

use crate::core::Condition;
use crate::enforcement::check_contract;
use crate::error::{ErrorCode, Result, ValidationError};
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;

/// Coarse classification of a declared state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateType {
    #[default]
    Operational,
    Snapshot,
    Error,
    Terminal,
}

fn default_true() -> bool {
    true
}

/// One declared state with its entry and exit actions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FsmStateDefinition {
    pub name: String,
    #[serde(default)]
    pub state_type: StateType,
    #[serde(default)]
    pub is_terminal: bool,
    #[serde(default = "default_true")]
    pub is_recoverable: bool,
    #[serde(default)]
    pub entry_actions: Vec<String>,
    #[serde(default)]
    pub exit_actions: Vec<String>,
}

impl FsmStateDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state_type: StateType::Operational,
            is_terminal: false,
            is_recoverable: true,
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
        }
    }

    /// A terminal, non-recoverable state.
    pub fn terminal(name: impl Into<String>) -> Self {
        Self {
            state_type: StateType::Terminal,
            is_terminal: true,
            is_recoverable: false,
            ..Self::new(name)
        }
    }

    pub fn error(name: impl Into<String>) -> Self {
        Self {
            state_type: StateType::Error,
            ..Self::new(name)
        }
    }

    pub fn on_entry(mut self, action: impl Into<String>) -> Self {
        self.entry_actions.push(action.into());
        self
    }

    pub fn on_exit(mut self, action: impl Into<String>) -> Self {
        self.exit_actions.push(action.into());
        self
    }

    pub fn recoverable(mut self, recoverable: bool) -> Self {
        self.is_recoverable = recoverable;
        self
    }
}

/// Serialized form of a guard condition.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct GuardConditionSpec {
    name: String,
    expression: String,
    #[serde(default = "default_true")]
    required: bool,
}

/// Guard condition gating a transition, with its parsed expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "GuardConditionSpec", into = "GuardConditionSpec")]
pub struct FsmGuardCondition {
    pub name: String,
    pub expression: String,
    pub required: bool,
    condition: Condition,
}

impl From<GuardConditionSpec> for FsmGuardCondition {
    fn from(spec: GuardConditionSpec) -> Self {
        Self::new(spec.name, spec.expression, spec.required)
    }
}

impl From<FsmGuardCondition> for GuardConditionSpec {
    fn from(guard: FsmGuardCondition) -> Self {
        Self {
            name: guard.name,
            expression: guard.expression,
            required: guard.required,
        }
    }
}

impl FsmGuardCondition {
    pub fn new(name: impl Into<String>, expression: impl Into<String>, required: bool) -> Self {
        let expression = expression.into();
        let condition = Condition::parse(&expression);
        Self {
            name: name.into(),
            expression,
            required,
            condition,
        }
    }

    pub fn required(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(name, expression, true)
    }

    pub fn optional(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(name, expression, false)
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}

/// Transition between two declared states on a trigger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FsmTransitionDefinition {
    pub name: String,
    pub from_state: String,
    pub to_state: String,
    pub trigger: String,
    #[serde(default)]
    pub conditions: Vec<FsmGuardCondition>,
}

impl FsmTransitionDefinition {
    pub fn new(
        name: impl Into<String>,
        from_state: impl Into<String>,
        to_state: impl Into<String>,
        trigger: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_state: from_state.into(),
            to_state: to_state.into(),
            trigger: trigger.into(),
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: FsmGuardCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn required_conditions(&self) -> impl Iterator<Item = &FsmGuardCondition> {
        self.conditions.iter().filter(|c| c.required)
    }
}

/// Complete contract governing one reducer.
///
/// Invariants (checked by [`FsmSubcontract::validate`]): state names are
/// unique, `initial_state` and every transition endpoint are declared, and
/// terminal states have no outgoing transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FsmSubcontract {
    pub name: String,
    pub version: String,
    pub initial_state: String,
    pub states: Vec<FsmStateDefinition>,
    #[serde(default)]
    pub transitions: Vec<FsmTransitionDefinition>,
    #[serde(default)]
    pub terminal_states: Vec<String>,
    #[serde(default)]
    pub error_states: Vec<String>,
}

impl FsmSubcontract {
    /// Deserialize and validate a contract document.
    pub fn from_json(json: &str) -> Result<Self> {
        let contract: Self = serde_json::from_str(json).map_err(|e| {
            ValidationError::new(
                ErrorCode::InvalidContract,
                format!("contract document is not valid: {e}"),
            )
        })?;
        contract.validate()?;
        Ok(contract)
    }

    /// Check every structural invariant, reporting all violations at once.
    pub fn validate(&self) -> Result<()> {
        match check_contract(self) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(violations) => {
                let details: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                Err(ValidationError::new(
                    ErrorCode::InvalidContract,
                    format!(
                        "contract '{}' v{} has {} violation(s)",
                        self.name,
                        self.version,
                        details.len()
                    ),
                )
                .with("contract", self.name.clone())
                .with("version", self.version.clone())
                .with("violations", details.join("; ")))
            }
        }
    }

    pub fn state(&self, name: &str) -> Option<&FsmStateDefinition> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.state(name).is_some()
    }

    /// Listed in `terminal_states` or flagged `is_terminal`.
    pub fn is_terminal(&self, name: &str) -> bool {
        self.terminal_states.iter().any(|s| s == name)
            || self.state(name).is_some_and(|s| s.is_terminal)
    }

    pub fn is_error_state(&self, name: &str) -> bool {
        self.error_states.iter().any(|s| s == name)
            || self
                .state(name)
                .is_some_and(|s| s.state_type == StateType::Error)
    }

    /// Transitions leaving `state`, in declaration order.
    pub fn transitions_from<'a, 's>(
        &'a self,
        state: &'s str,
    ) -> impl Iterator<Item = &'a FsmTransitionDefinition> + 's
    where
        'a: 's,
    {
        self.transitions.iter().filter(move |t| t.from_state == state)
    }

    /// First declared transition leaving `from_state` on `trigger`.
    pub fn find_transition(&self, from_state: &str, trigger: &str) -> Option<&FsmTransitionDefinition> {
        self.transitions
            .iter()
            .find(|t| t.from_state == from_state && t.trigger == trigger)
    }
}
