//! Structural error raised across the engine boundary.
//!
//! Only fail-fast, structural problems become errors. Blocked transitions,
//! degenerate recovery plans and checkpoint evictions are normal outcomes
//! and are reported through return values instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Stable machine code carried by every [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Reduction input carried no trigger, or a blank one.
    MissingTrigger,
    /// No transition leaves the current state on the given trigger.
    UnknownTrigger,
    /// Contract failed structural validation at construction.
    InvalidContract,
    /// A snapshot referenced a state the contract does not declare.
    UndeclaredState,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTrigger => "missing_trigger",
            Self::UnknownTrigger => "unknown_trigger",
            Self::InvalidContract => "invalid_contract",
            Self::UndeclaredState => "undeclared_state",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural failure with enough context to log without further lookups.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
    pub context: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Attach one context entry, returning the error for chaining.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

/// Result alias used by fallible engine operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let err = ValidationError::new(ErrorCode::UnknownTrigger, "no transition for 'go'");
        assert_eq!(err.to_string(), "[unknown_trigger] no transition for 'go'");
    }

    #[test]
    fn context_entries_are_kept() {
        let err = ValidationError::new(ErrorCode::MissingTrigger, "trigger required")
            .with("contract", "orders")
            .with("from_state", "idle");

        assert_eq!(err.context_value("contract"), Some("orders"));
        assert_eq!(err.context_value("from_state"), Some("idle"));
        assert_eq!(err.context_value("to_state"), None);
    }

    #[test]
    fn code_serializes_as_snake_case() {
        let json = serde_json::to_string(&ErrorCode::InvalidContract).unwrap();
        assert_eq!(json, "\"invalid_contract\"");
    }
}
