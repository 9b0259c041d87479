//! Workflow lifecycle states and the fixed transition table.

crate::state_enum! {
    /// Lifecycle of one workflow as tracked by the ledger.
    pub enum WorkflowState {
        Pending => "PENDING",
        Running => "RUNNING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Cancelled => "CANCELLED",
        Simulated => "SIMULATED",
    }
    final: [Completed, Cancelled]
    error: [Failed]
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::Pending
    }
}

impl WorkflowState {
    /// Whether the fixed table allows moving from `self` to `to`.
    pub fn can_transition_to(self, to: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, to),
            (Pending, Running | Cancelled)
                | (Running, Completed | Failed | Cancelled)
                | (Failed, Running | Cancelled)
                | (Simulated, Running | Completed)
        )
    }

    /// Allowed successors in declaration order.
    pub fn successors(self) -> Vec<WorkflowState> {
        Self::ALL
            .iter()
            .copied()
            .filter(|to| self.can_transition_to(*to))
            .collect()
    }
}
