//! Validation-based enforcement for contracts and transition guards.
//!
//! Both contract checks and guard checks use Stillwater's `Validation` type to
//! accumulate ALL violations instead of stopping at the first one, so a
//! broken contract or a blocked transition is explained in a single pass.
//!
//! # Example
//!
//! ```rust
//! use fsm_reducer::contract::{FsmGuardCondition, FsmTransitionDefinition};
//! use fsm_reducer::core::{ConditionEvaluator, Context};
//! use fsm_reducer::enforcement::enforce_guards;
//!
//! let transition = FsmTransitionDefinition::new("approve", "review", "approved", "approve")
//!     .with_condition(FsmGuardCondition::required("signed", "signed == true"));
//!
//! let report = enforce_guards(&transition, &Context::new(), &ConditionEvaluator::default());
//! assert!(report.is_blocked());
//! ```

pub mod rules;
pub mod violations;

pub use rules::{check_contract, enforce_guards, ConditionOutcome, GuardReport};
pub use violations::{ContractViolation, GuardViolation};
