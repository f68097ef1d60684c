//! Error types for pagesmith

use std::time::Duration;

use thiserror::Error;

use crate::deploy::steps::PublishStep;

/// Main error type for pagesmith
#[derive(Error, Debug)]
pub enum PagesmithError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to materialize '{name}': {reason}")]
    MaterializationError { name: String, reason: String },

    #[error("Publish failed at step '{step}' ({command}): {detail}")]
    PublishError {
        step: PublishStep,
        command: String,
        detail: String,
    },

    #[error("Step '{step}' timed out after {timeout:?}")]
    TimeoutError { step: PublishStep, timeout: Duration },

    #[error("Agent invocation failed: {0}")]
    AgentInvocationError(String),

    #[error("A deployment for task '{0}' is already in progress")]
    LeaseConflict(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl PagesmithError {
    /// Name of the step that failed, for publish and timeout errors
    pub fn failed_step(&self) -> Option<PublishStep> {
        match self {
            PagesmithError::PublishError { step, .. } => Some(*step),
            PagesmithError::TimeoutError { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub(crate) fn materialization(name: impl Into<String>, reason: impl Into<String>) -> Self {
        PagesmithError::MaterializationError {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
