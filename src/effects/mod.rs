//! FSM execution and the side-effect records it produces.
//!
//! This module is the boundary between the pure core and the hosting node
//! framework:
//!
//! - **Executor**: drives a runtime snapshot through a contract per input
//! - **Intents**: ordered data records describing side effects
//! - **Reductions**: JSON-serializable input/output records
//!
//! The executor never performs I/O. Persistence, metrics and action
//! dispatch happen outside, driven by the emitted intents.
//!
//! # Example
//!
//! ```rust
//! use fsm_reducer::builder::linear_contract;
//! use fsm_reducer::effects::{FsmExecutor, ReductionInput};
//!
//! let contract = linear_contract("jobs", &["idle", "processing", "completed"], "next").unwrap();
//! let executor = FsmExecutor::new(contract).unwrap();
//!
//! let output = executor.process(&ReductionInput::trigger("next")).unwrap();
//! assert!(output.fsm_success());
//! assert_eq!(executor.get_current_state(), "processing");
//! assert_eq!(executor.get_state_history(), vec!["idle".to_string()]);
//! ```

mod executor;
mod intent;
mod reduction;

pub use executor::{ExecutorConfig, FsmExecutor, Reducer};
pub use intent::{
    emit_transition_intents, ActionPhase, Intent, IntentType, ACTION_DISPATCHER, METRICS_PIPELINE,
    STATE_PERSISTENCE,
};
pub use reduction::{
    ConflictResolution, OutputMetadata, ReductionInput, ReductionMetadata, ReductionOutput,
    ReductionType, StreamingMode,
};
