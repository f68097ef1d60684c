//! Round controller
//!
//! A round number is validated once and turned into a [`Lifecycle`]. The
//! publisher branches on the lifecycle only; the raw integer never travels
//! further than this module except for display.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::PagesmithError;

/// Which branch of the publish lifecycle a round takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// First round: create the remote repository and enable hosting
    Create,
    /// Later rounds: clone the existing repository and push an update
    Update,
}

/// A validated deployment round (always >= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Round(u32);

impl Round {
    pub const FIRST: Round = Round(1);

    /// Validate a caller-supplied round number
    pub fn new(value: i64) -> Result<Self, PagesmithError> {
        if value <= 0 {
            return Err(PagesmithError::ConfigError(format!(
                "round must be >= 1, got {}",
                value
            )));
        }
        u32::try_from(value).map(Round).map_err(|_| {
            PagesmithError::ConfigError(format!("round {} is out of range", value))
        })
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.0 == 1 {
            Lifecycle::Create
        } else {
            Lifecycle::Update
        }
    }

    pub fn commit_message(&self) -> String {
        match self.lifecycle() {
            Lifecycle::Create => "Initial commit".to_string(),
            Lifecycle::Update => format!("Round {} update", self.0),
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
