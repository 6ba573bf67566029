//! Error Types
//!
//! Errors that cross the executor boundary. Per-step collaborator
//! failures are not here: they are captured into the run record as data
//! (see [`crate::content::CollaboratorError`]).

use thiserror::Error;

use crate::workflow::model::RunId;

/// Errors surfaced by the workflow executor and its status store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// The request was rejected before any run was created.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No record exists for the identifier (never issued, or evicted).
    #[error("run {0} not found")]
    RunNotFound(RunId),

    /// A record with this identifier already exists.
    #[error("run {0} already exists")]
    DuplicateRun(RunId),

    /// A run record invariant would have been broken.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl WorkflowError {
    /// Returns true for errors that indicate a bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::DuplicateRun(_) | Self::Invariant(_))
    }
}

/// Errors raised while loading [`crate::config::Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        let id = RunId::new();
        assert!(WorkflowError::DuplicateRun(id).is_internal());
        assert!(WorkflowError::Invariant("x".into()).is_internal());
        assert!(!WorkflowError::RunNotFound(id).is_internal());
        assert!(!WorkflowError::InvalidRequest("x".into()).is_internal());
    }

    #[test]
    fn test_display_messages() {
        let err = WorkflowError::InvalidRequest("itemCount must be at least 1".into());
        assert_eq!(err.to_string(), "invalid request: itemCount must be at least 1");

        let err = ConfigError::InvalidValue {
            key: "WORKFLOW_DEFAULT_COUNT".into(),
            value: "many".into(),
        };
        assert_eq!(err.to_string(), "invalid value for WORKFLOW_DEFAULT_COUNT: 'many'");
    }
}
