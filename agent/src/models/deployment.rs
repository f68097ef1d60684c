//! Deployment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::task::{Attachment, Task};

/// A full deployment request: generate code for the task, then publish it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRequest {
    pub task: Task,

    /// Round number; validated by the round controller, so kept signed here
    #[serde(default = "default_round")]
    pub round: i64,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

fn default_round() -> i64 {
    1
}

/// Outcome of one successful publish run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    /// Public repository URL
    pub repo_url: String,

    /// Full revision id of the pushed commit
    pub commit_sha: String,

    /// Static hosting URL
    pub pages_url: String,

    /// Round that produced this result
    pub round: u32,

    pub deployed_at: DateTime<Utc>,
}
