//! Core FSM types and logic.
//!
//! This module contains the pure core of the engine:
//! - State definitions via the `State` trait
//! - Guard conditions and their evaluator
//! - Immutable runtime snapshots
//!
//! Nothing in this module performs I/O or takes locks.

mod guard;
mod snapshot;
mod state;

pub use guard::{
    resolve_field, Condition, ConditionEvaluator, Context, Literal, PredicateFn, PredicateRegistry,
};
pub use snapshot::FsmRuntimeSnapshot;
pub use state::State;
