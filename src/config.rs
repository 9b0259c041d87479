//! Engine-wide configuration.

use crate::checkpoint::CheckpointConfig;
use crate::effects::ExecutorConfig;
use crate::workflow::{LedgerConfig, PlannerConfig};
use serde::{Deserialize, Serialize};

/// Every tunable in one document. Missing sections and fields take their
/// defaults.
///
/// ```
/// use fsm_reducer::config::EngineConfig;
///
/// let config: EngineConfig =
///     serde_json::from_str(r#"{ "checkpoints": { "max_checkpoints_per_workflow": 3 } }"#).unwrap();
/// assert_eq!(config.checkpoints.max_checkpoints_per_workflow, 3);
/// assert_eq!(config.checkpoints.retention_hours, 24);
/// assert_eq!(config.executor.max_history, 100);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub executor: ExecutorConfig,
    pub checkpoints: CheckpointConfig,
    pub ledger: LedgerConfig,
    pub planner: PlannerConfig,
}
