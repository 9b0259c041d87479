//! Violations reported by contract and guard enforcement.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural problems found while validating a contract.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContractViolation {
    #[error("duplicate state '{name}'")]
    DuplicateState { name: String },

    #[error("initial state '{name}' is not declared")]
    UndeclaredInitialState { name: String },

    #[error("transition '{transition}' references undeclared state '{state}'")]
    DanglingTransition { transition: String, state: String },

    #[error("terminal state '{name}' is not declared")]
    UndeclaredTerminalState { name: String },

    #[error("error state '{name}' is not declared")]
    UndeclaredErrorState { name: String },

    #[error("terminal state '{state}' has outgoing transition '{transition}'")]
    TerminalStateHasTransitions { state: String, transition: String },

    /// Triggers must be non-blank with no surrounding whitespace.
    #[error("transition '{transition}' has blank or padded trigger '{trigger}'")]
    BlankOrPaddedTrigger { transition: String, trigger: String },
}

/// Why a required guard blocked a transition.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuardViolation {
    #[error("condition '{name}' ({expression}) evaluated false")]
    ConditionFailed { name: String, expression: String },

    #[error("condition '{name}' has malformed expression '{expression}'")]
    MalformedCondition { name: String, expression: String },
}
