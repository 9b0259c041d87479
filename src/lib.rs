//! fsm-reducer: contract-driven state machines for reducer nodes
//!
//! A reducer node's lifecycle is governed by a declarative FSM contract.
//! The executor validates each trigger against the contract, evaluates guard
//! conditions, and answers with the new state plus an ordered list of
//! intents describing the side effects someone else should perform. The
//! core is pure: it never does I/O and never sleeps.
//!
//! Around it sits best-effort workflow coordination: a bounded checkpoint
//! store, a ledger auditing workflow lifecycle transitions, and a planner
//! that turns a failure into a recovery recommendation.
//!
//! # Core Concepts
//!
//! - **Contract**: states, transitions, guards and actions, validated once
//! - **Executor**: single-writer driver of one runtime snapshot
//! - **Intents**: side effects as data
//! - **Checkpoints**: bounded, expiring snapshots usable as recovery points
//! - **Ledger**: audit trail of workflow lifecycle moves
//!
//! # Example
//!
//! ```rust
//! use fsm_reducer::builder::{ContractBuilder, TransitionBuilder};
//! use fsm_reducer::contract::FsmStateDefinition;
//! use fsm_reducer::effects::{FsmExecutor, IntentType, ReductionInput};
//! use serde_json::json;
//!
//! let contract = ContractBuilder::new("ingest", "1.0.0")
//!     .initial("idle")
//!     .state(FsmStateDefinition::new("idle").on_exit("release_slot"))
//!     .state(FsmStateDefinition::new("processing").on_entry("acquire_lock"))
//!     .state(FsmStateDefinition::terminal("completed"))
//!     .transition(
//!         TransitionBuilder::new()
//!             .from("idle")
//!             .to("processing")
//!             .on("start")
//!             .when("ready", "status == ready"),
//!     )
//!     .unwrap()
//!     .transition(TransitionBuilder::new().from("processing").to("completed").on("finish"))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let executor = FsmExecutor::new(contract).unwrap();
//!
//! // Guard fails: a normal, unsuccessful output.
//! let blocked = executor.process(&ReductionInput::trigger("start")).unwrap();
//! assert!(!blocked.fsm_success());
//! assert!(blocked.intents.is_empty());
//!
//! // Guard passes on an input extension field.
//! let input = ReductionInput::trigger("start").with_extension("status", json!("ready"));
//! let output = executor.process(&input).unwrap();
//! assert_eq!(output.fsm_state(), "processing");
//! assert_eq!(output.intents.last().unwrap().intent_type, IntentType::RecordMetric);
//!
//! // Unknown trigger: a structural error.
//! assert!(executor.process(&ReductionInput::trigger("bogus")).is_err());
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod contract;
pub mod core;
pub mod effects;
pub mod enforcement;
pub mod error;
pub mod workflow;

// Re-export commonly used types
pub use checkpoint::{Checkpoint, CheckpointRequest, CheckpointStore};
pub use config::EngineConfig;
pub use contract::{FsmStateDefinition, FsmSubcontract, FsmTransitionDefinition};
pub use self::core::{ConditionEvaluator, FsmRuntimeSnapshot, State};
pub use effects::{FsmExecutor, Intent, Reducer, ReductionInput, ReductionOutput};
pub use error::{ErrorCode, Result, ValidationError};
pub use workflow::{RecoveryPlanner, TransitionLedger, WorkflowState};
