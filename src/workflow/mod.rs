//! Workflow-level coordination: lifecycle ledger, recovery planning and
//! analytics.
//!
//! Unlike the node-local executor in [`crate::effects`], nothing in this
//! module returns an error. Invalid lifecycle moves are recorded and
//! reported as `false`, and the planner always produces a plan.
//!
//! ```
//! use fsm_reducer::workflow::{TransitionLedger, WorkflowState};
//!
//! let ledger = TransitionLedger::default();
//! ledger.initialize_workflow_state("wf-1", WorkflowState::Pending);
//!
//! assert!(ledger.transition_workflow_state("wf-1", WorkflowState::Running, "start", None));
//! assert!(!ledger.transition_workflow_state("wf-1", WorkflowState::Pending, "rewind", None));
//! assert_eq!(ledger.current_state("wf-1"), Some(WorkflowState::Running));
//! assert_eq!(ledger.get_state_history("wf-1").len(), 2);
//! ```

pub mod analytics;
pub mod ledger;
pub mod recovery;
pub mod state;

pub use analytics::{CheckpointAnalytics, RecoveryAnalytics, StateAnalytics};
pub use ledger::{LedgerConfig, StateTransitionRecord, TransitionLedger};
pub use recovery::{
    PlannerConfig, RecoveryPlan, RecoveryPlanner, RecoveryStep, RecoveryStrategy,
    LOW_CONFIDENCE_THRESHOLD,
};
pub use state::WorkflowState;
