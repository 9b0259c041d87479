//! Builder for constructing FSM contracts.

use crate::builder::transition::TransitionBuilder;
use crate::contract::{FsmStateDefinition, FsmSubcontract, FsmTransitionDefinition};
use crate::error::{ErrorCode, Result, ValidationError};

/// Builder for constructing contracts with a fluent API.
///
/// `build()` runs full contract validation, so a contract obtained from the
/// builder is always structurally sound.
#[derive(Debug)]
pub struct ContractBuilder {
    name: String,
    version: String,
    initial: Option<String>,
    states: Vec<FsmStateDefinition>,
    transitions: Vec<FsmTransitionDefinition>,
    terminal_states: Vec<String>,
    error_states: Vec<String>,
}

impl ContractBuilder {
    /// Create a new builder.
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            initial: None,
            states: Vec::new(),
            transitions: Vec::new(),
            terminal_states: Vec::new(),
            error_states: Vec::new(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: &str) -> Self {
        self.initial = Some(state.to_string());
        self
    }

    /// Declare a state. Terminal definitions are also listed as terminal states.
    pub fn state(mut self, state: FsmStateDefinition) -> Self {
        if state.is_terminal && !self.terminal_states.contains(&state.name) {
            self.terminal_states.push(state.name.clone());
        }
        self.states.push(state);
        self
    }

    /// Mark an already declared (or later declared) state as an error state.
    pub fn error_state(mut self, name: &str) -> Self {
        self.error_states.push(name.to_string());
        self
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(mut self, builder: TransitionBuilder) -> Result<Self> {
        let transition = builder.build()?;
        self.transitions.push(transition);
        Ok(self)
    }

    /// Add a pre-built transition.
    pub fn add_transition(mut self, transition: FsmTransitionDefinition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Build and validate the contract.
    pub fn build(self) -> Result<FsmSubcontract> {
        let initial_state = self.initial.ok_or_else(|| {
            ValidationError::new(
                ErrorCode::InvalidContract,
                "initial state not specified. Call .initial(state) before .build()",
            )
            .with("contract", self.name.clone())
        })?;

        let contract = FsmSubcontract {
            name: self.name,
            version: self.version,
            initial_state,
            states: self.states,
            transitions: self.transitions,
            terminal_states: self.terminal_states,
            error_states: self.error_states,
        };
        contract.validate()?;
        Ok(contract)
    }
}
