//! Runtime snapshot of one FSM executor.
//!
//! Snapshots are immutable values. Advancing returns a new snapshot; the
//! executor swaps it in wholesale, so readers holding an older snapshot keep
//! a consistent view.

use super::guard::Context;
use serde::{Deserialize, Serialize};

/// Current state, visited states and opaque context of one executor.
///
/// `history` holds previously visited states in visit order; the current
/// state is never part of it.
///
/// # Example
///
/// ```rust
/// use fsm_reducer::core::FsmRuntimeSnapshot;
///
/// let snapshot = FsmRuntimeSnapshot::new("idle");
/// let next = snapshot.advance("processing", 100);
///
/// assert_eq!(next.current_state, "processing");
/// assert_eq!(next.history, vec!["idle".to_string()]);
/// assert!(snapshot.history.is_empty()); // Original unchanged
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FsmRuntimeSnapshot {
    pub current_state: String,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub context: Context,
}

impl FsmRuntimeSnapshot {
    pub fn new(initial_state: impl Into<String>) -> Self {
        Self {
            current_state: initial_state.into(),
            history: Vec::new(),
            context: Context::new(),
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Move to `to_state`, returning a new snapshot.
    ///
    /// The prior state is appended to history; when history would exceed
    /// `max_history` entries the oldest are dropped. A `max_history` of zero
    /// keeps no history at all.
    pub fn advance(&self, to_state: impl Into<String>, max_history: usize) -> Self {
        let mut history = self.history.clone();
        history.push(self.current_state.clone());
        if history.len() > max_history {
            let excess = history.len() - max_history;
            history.drain(..excess);
        }
        Self {
            current_state: to_state.into(),
            history,
            context: self.context.clone(),
        }
    }

    /// Visited states followed by the current state.
    pub fn path(&self) -> Vec<&str> {
        self.history
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.current_state.as_str()))
            .collect()
    }

    pub fn previous_state(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_snapshot_has_empty_history() {
        let snapshot = FsmRuntimeSnapshot::new("idle");
        assert_eq!(snapshot.current_state, "idle");
        assert!(snapshot.history.is_empty());
        assert!(snapshot.context.is_empty());
        assert_eq!(snapshot.previous_state(), None);
    }

    #[test]
    fn advance_is_immutable() {
        let snapshot = FsmRuntimeSnapshot::new("idle");
        let next = snapshot.advance("busy", 10);

        assert_eq!(snapshot.current_state, "idle");
        assert_eq!(next.current_state, "busy");
        assert_eq!(next.previous_state(), Some("idle"));
    }

    #[test]
    fn advance_bounds_history() {
        let mut snapshot = FsmRuntimeSnapshot::new("s0");
        for i in 1..=5 {
            snapshot = snapshot.advance(format!("s{i}"), 3);
        }

        assert_eq!(snapshot.history, vec!["s2", "s3", "s4"]);
        assert_eq!(snapshot.current_state, "s5");
    }

    #[test]
    fn zero_max_history_keeps_nothing() {
        let snapshot = FsmRuntimeSnapshot::new("a").advance("b", 0);
        assert!(snapshot.history.is_empty());
    }

    #[test]
    fn advance_carries_context() {
        let mut context = Context::new();
        context.insert("tenant".to_string(), json!("acme"));
        let snapshot = FsmRuntimeSnapshot::new("a").with_context(context.clone());

        assert_eq!(snapshot.advance("b", 5).context, context);
    }

    #[test]
    fn path_ends_with_current_state() {
        let snapshot = FsmRuntimeSnapshot::new("a").advance("b", 5).advance("c", 5);
        assert_eq!(snapshot.path(), vec!["a", "b", "c"]);
    }

    #[test]
    fn snapshot_serializes_correctly() {
        let snapshot = FsmRuntimeSnapshot::new("a").advance("b", 5);
        let json = serde_json::to_string(&snapshot).unwrap();
        let deserialized: FsmRuntimeSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, deserialized);
    }
}
