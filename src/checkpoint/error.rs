//! Checkpoint encoding errors.

use thiserror::Error;

/// Errors raised while encoding or decoding a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint encoding failed: {0}")]
    SerializationFailed(String),

    #[error("checkpoint decoding failed: {0}")]
    DeserializationFailed(String),

    /// Written by a newer (or unknown) format revision.
    #[error("unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Decoded fine but violates a checkpoint invariant.
    #[error("checkpoint '{id}' is invalid: {reason}")]
    ValidationFailed { id: String, reason: String },
}
