//! Core State trait for enumerated states.
//!
//! Workflow-level states are a closed enum and implement this trait, which
//! provides pure methods for inspecting state properties without side effects.
//! Node-local FSM states are contract-declared names and live in
//! [`crate::contract`] instead.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for enumerated states.
///
/// All methods are pure - no side effects.
///
/// # Example
///
/// ```rust
/// use fsm_reducer::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum JobState {
///     Queued,
///     Running,
///     Done,
///     Crashed,
/// }
///
/// impl State for JobState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Queued => "QUEUED",
///             Self::Running => "RUNNING",
///             Self::Done => "DONE",
///             Self::Crashed => "CRASHED",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Done | Self::Crashed)
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Crashed)
///     }
/// }
///
/// assert!(JobState::Crashed.is_final());
/// assert_eq!(JobState::Running.name(), "RUNNING");
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Error states are not necessarily final: a failed workflow may be resumed.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}
