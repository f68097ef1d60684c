//! Finite State Machine for a single publish run

use serde::{Deserialize, Serialize};

use crate::deploy::steps::PublishStep;

/// Publish run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Nothing done yet
    Pending,

    /// Working directory is being populated (includes the clone on update)
    Preparing,

    /// Committing and pushing to the remote
    Publishing,

    /// Reading back the revision and computing locators
    Finalizing,

    /// Run completed
    Published,

    /// Run aborted
    Failed,
}

/// Publish run event
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// Start the run
    Begin,

    /// Working directory populated
    Prepared,

    /// Commits pushed (and hosting enabled on create)
    Pushed,

    /// Revision read back
    Finalized,

    /// A step failed
    Fail(PublishStep, String),
}

/// Publish run FSM
#[derive(Debug, Clone)]
pub struct LifecycleFsm {
    state: LifecycleState,
    failed_step: Option<PublishStep>,
    error: Option<String>,
}

impl LifecycleFsm {
    /// Create a new FSM in pending state
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Pending,
            failed_step: None,
            error: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Step that caused the failure, if any
    pub fn failed_step(&self) -> Option<PublishStep> {
        self.failed_step
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Where the run ended up, e.g. `published` or `failed at push: <error>`
    pub fn summary(&self) -> String {
        match (self.failed_step, self.error.as_deref()) {
            (Some(step), Some(error)) => format!("failed at {}: {}", step, error),
            _ => format!("{:?}", self.state).to_lowercase(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, LifecycleState::Published | LifecycleState::Failed)
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: LifecycleEvent) -> Result<(), String> {
        let new_state = match (&self.state, &event) {
            (LifecycleState::Pending, LifecycleEvent::Begin) => LifecycleState::Preparing,
            (LifecycleState::Preparing, LifecycleEvent::Prepared) => LifecycleState::Publishing,
            (LifecycleState::Publishing, LifecycleEvent::Pushed) => LifecycleState::Finalizing,
            (LifecycleState::Finalizing, LifecycleEvent::Finalized) => LifecycleState::Published,

            // Any non-terminal state can fail
            (
                LifecycleState::Pending
                | LifecycleState::Preparing
                | LifecycleState::Publishing
                | LifecycleState::Finalizing,
                LifecycleEvent::Fail(step, err),
            ) => {
                self.failed_step = Some(*step);
                self.error = Some(err.clone());
                LifecycleState::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for LifecycleFsm {
    fn default() -> Self {
        Self::new()
    }
}
