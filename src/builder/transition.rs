//! Builder for constructing transition definitions.

use crate::contract::{FsmGuardCondition, FsmTransitionDefinition};
use crate::error::{ErrorCode, Result, ValidationError};

/// Builder for constructing transitions with a fluent API.
#[derive(Debug, Default)]
pub struct TransitionBuilder {
    name: Option<String>,
    from: Option<String>,
    to: Option<String>,
    trigger: Option<String>,
    conditions: Vec<FsmGuardCondition>,
}

impl TransitionBuilder {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transition name. Defaults to `"{from}_to_{to}"`.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the source state (required).
    pub fn from(mut self, state: &str) -> Self {
        self.from = Some(state.to_string());
        self
    }

    /// Set the target state (required).
    pub fn to(mut self, state: &str) -> Self {
        self.to = Some(state.to_string());
        self
    }

    /// Set the trigger (required).
    pub fn on(mut self, trigger: &str) -> Self {
        self.trigger = Some(trigger.to_string());
        self
    }

    /// Add a required guard condition.
    pub fn when(mut self, name: &str, expression: &str) -> Self {
        self.conditions
            .push(FsmGuardCondition::required(name, expression));
        self
    }

    /// Add an advisory guard condition that never blocks.
    pub fn when_optional(mut self, name: &str, expression: &str) -> Self {
        self.conditions
            .push(FsmGuardCondition::optional(name, expression));
        self
    }

    /// Build the transition.
    pub fn build(self) -> Result<FsmTransitionDefinition> {
        let missing = |what: &str| {
            ValidationError::new(
                ErrorCode::InvalidContract,
                format!("transition {what} not specified"),
            )
        };
        let from = self.from.ok_or_else(|| missing("source state"))?;
        let to = self.to.ok_or_else(|| missing("target state"))?;
        let trigger = self
            .trigger
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| missing("trigger").with("from_state", from.clone()))?;
        let name = self.name.unwrap_or_else(|| format!("{from}_to_{to}"));

        Ok(FsmTransitionDefinition {
            name,
            from_state: from,
            to_state: to,
            trigger,
            conditions: self.conditions,
        })
    }
}
