//! Records exchanged with the hosting node framework.

use super::intent::Intent;
use crate::core::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionType {
    #[default]
    Aggregate,
    Fold,
    Transform,
    Merge,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamingMode {
    #[default]
    None,
    Batch,
    Windowed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    #[default]
    LastWins,
    FirstWins,
    Merge,
    Error,
}

/// Input metadata. Unknown keys land in `extensions` and are visible to
/// guard conditions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReductionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extensions: Context,
}

fn default_batch_size() -> usize {
    1000
}

fn default_window_size_ms() -> u64 {
    5000
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReductionInput {
    #[serde(default = "Uuid::new_v4")]
    pub operation_id: Uuid,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub reduction_type: ReductionType,
    #[serde(default)]
    pub streaming_mode: StreamingMode,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_window_size_ms")]
    pub window_size_ms: u64,
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
    #[serde(default)]
    pub metadata: ReductionMetadata,
}

impl ReductionInput {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            operation_id: Uuid::new_v4(),
            items,
            reduction_type: ReductionType::default(),
            streaming_mode: StreamingMode::default(),
            batch_size: default_batch_size(),
            window_size_ms: default_window_size_ms(),
            conflict_resolution: ConflictResolution::default(),
            metadata: ReductionMetadata::default(),
        }
    }

    /// An input that only carries a trigger.
    pub fn trigger(trigger: &str) -> Self {
        Self::new(Vec::new()).with_trigger(trigger)
    }

    pub fn with_trigger(mut self, trigger: &str) -> Self {
        self.metadata.trigger = Some(trigger.to_string());
        self
    }

    pub fn with_extension(mut self, key: &str, value: Value) -> Self {
        self.metadata.extensions.insert(key.to_string(), value);
        self
    }

    pub fn with_streaming(mut self, mode: StreamingMode, batch_size: usize) -> Self {
        self.streaming_mode = mode;
        self.batch_size = batch_size;
        self
    }

    /// Number of batches the items span under the input's streaming mode.
    pub fn batch_count(&self) -> usize {
        if self.items.is_empty() {
            return 0;
        }
        match self.streaming_mode {
            StreamingMode::Batch => self.items.len().div_ceil(self.batch_size.max(1)),
            StreamingMode::None | StreamingMode::Windowed => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    pub fsm_state: String,
    pub fsm_success: bool,
    pub trigger: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReductionOutput {
    pub operation_id: Uuid,
    pub reduction_type: ReductionType,
    pub items_processed: usize,
    pub batches_processed: usize,
    pub streaming_mode: StreamingMode,
    pub processing_time_ms: f64,
    pub intents: Vec<Intent>,
    pub metadata: OutputMetadata,
    pub result: Value,
}

impl ReductionOutput {
    pub fn fsm_state(&self) -> &str {
        &self.metadata.fsm_state
    }

    pub fn fsm_success(&self) -> bool {
        self.metadata.fsm_success
    }
}
