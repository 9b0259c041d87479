//! Builder API for ergonomic contract construction.
//!
//! This module provides fluent builders for FSM contracts and a macro for
//! declaring enumerated states with minimal boilerplate.

pub mod contract;
pub mod macros;
pub mod transition;

pub use contract::ContractBuilder;
pub use transition::TransitionBuilder;

use crate::contract::{FsmStateDefinition, FsmSubcontract};
use crate::error::Result;

/// Build a linear contract: each state moves to the next on `trigger`,
/// and the last state is terminal.
///
/// # Example
///
/// ```
/// use fsm_reducer::builder::linear_contract;
///
/// let contract = linear_contract("pipeline", &["queued", "running", "done"], "advance").unwrap();
/// assert_eq!(contract.initial_state, "queued");
/// assert!(contract.is_terminal("done"));
/// ```
pub fn linear_contract(name: &str, states: &[&str], trigger: &str) -> Result<FsmSubcontract> {
    let mut builder = ContractBuilder::new(name, "1.0.0");
    if let Some(first) = states.first() {
        builder = builder.initial(first);
    }

    for (i, state) in states.iter().enumerate() {
        let definition = if i + 1 == states.len() {
            FsmStateDefinition::terminal(*state)
        } else {
            FsmStateDefinition::new(*state)
        };
        builder = builder.state(definition);
    }

    for pair in states.windows(2) {
        builder = builder.transition(TransitionBuilder::new().from(pair[0]).to(pair[1]).on(trigger))?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn linear_contract_builds() {
        let contract = linear_contract("flow", &["a", "b", "c"], "next").unwrap();

        assert_eq!(contract.transitions.len(), 2);
        assert_eq!(contract.find_transition("a", "next").unwrap().to_state, "b");
        assert!(contract.is_terminal("c"));
    }

    #[test]
    fn empty_linear_contract_is_rejected() {
        let err = linear_contract("flow", &[], "next").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidContract);
    }
}
