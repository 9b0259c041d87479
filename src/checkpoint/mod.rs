//! Checkpoints protecting long-running workflows from partial failure.
//!
//! A checkpoint is a named, timestamped snapshot of workflow and node state.
//! The [`CheckpointStore`] keeps a bounded number per workflow in memory; it
//! never writes to storage itself. Checkpoints encode to JSON (readable) or
//! to a versioned binary envelope (compact) for whoever does persist them.

use crate::core::FsmRuntimeSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

pub mod error;
mod store;

pub use error::CheckpointError;
pub use store::{CheckpointConfig, CheckpointStore, CleanupReport};

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Named snapshot of one workflow at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub id: Uuid,
    pub workflow_id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub workflow_state: Value,
    /// Per-node state keyed by node id.
    pub node_states: BTreeMap<String, Value>,
    pub execution_context: Value,
    /// Flagged safe to roll back to.
    pub is_recovery_point: bool,
    pub metadata: BTreeMap<String, Value>,
}

/// Binary framing: version header readable without decoding the body.
#[derive(Serialize, Deserialize)]
struct BinaryEnvelope {
    version: u32,
    body: Vec<u8>,
}

impl Checkpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        let body =
            serde_json::to_vec(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))?;
        bincode::serialize(&BinaryEnvelope {
            version: self.version,
            body,
        })
        .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let envelope: BinaryEnvelope = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        if envelope.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: envelope.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        let checkpoint: Self = serde_json::from_slice(&envelope.body)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Check format version and required fields.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        let invalid = |reason: &str| CheckpointError::ValidationFailed {
            id: self.id.to_string(),
            reason: reason.to_string(),
        };
        if self.workflow_id.trim().is_empty() {
            return Err(invalid("workflow id is empty"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        Ok(())
    }

    /// Decode a node's state as an FSM runtime snapshot.
    pub fn node_snapshot(&self, node_id: &str) -> Result<Option<FsmRuntimeSnapshot>, CheckpointError> {
        self.node_states
            .get(node_id)
            .map(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
            })
            .transpose()
    }
}

/// Everything needed to create a checkpoint; the store assigns id and time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CheckpointRequest {
    pub workflow_id: String,
    pub name: String,
    pub workflow_state: Value,
    pub node_states: BTreeMap<String, Value>,
    pub execution_context: Value,
    pub is_recovery_point: bool,
    pub metadata: BTreeMap<String, Value>,
}

impl CheckpointRequest {
    pub fn new(workflow_id: &str, name: &str) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn workflow_state(mut self, state: Value) -> Self {
        self.workflow_state = state;
        self
    }

    pub fn node_state(mut self, node_id: &str, state: Value) -> Self {
        self.node_states.insert(node_id.to_string(), state);
        self
    }

    /// Record an executor snapshot as a node's state.
    pub fn node_snapshot(
        self,
        node_id: &str,
        snapshot: &FsmRuntimeSnapshot,
    ) -> Result<Self, CheckpointError> {
        let value = serde_json::to_value(snapshot)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))?;
        Ok(self.node_state(node_id, value))
    }

    pub fn execution_context(mut self, context: Value) -> Self {
        self.execution_context = context;
        self
    }

    pub fn recovery_point(mut self, is_recovery_point: bool) -> Self {
        self.is_recovery_point = is_recovery_point;
        self
    }

    pub fn metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub(crate) fn into_checkpoint(self, timestamp: DateTime<Utc>) -> Checkpoint {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            workflow_id: self.workflow_id,
            name: self.name,
            timestamp,
            workflow_state: self.workflow_state,
            node_states: self.node_states,
            execution_context: self.execution_context,
            is_recovery_point: self.is_recovery_point,
            metadata: self.metadata,
        }
    }
}
