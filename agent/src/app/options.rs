//! Runtime options

use std::path::PathBuf;
use std::time::Duration;

use crate::deploy::target::{DEFAULT_BRANCH, DEFAULT_REPO_PREFIX};

/// Publish lifecycle options
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Prefix of every repository name (`<prefix>-<task id>`)
    pub repo_prefix: String,

    /// Canonical branch, used for history and static hosting
    pub branch: String,

    /// Deadline for each git / gh command
    pub command_timeout: Duration,

    /// Parent of the per-run working directories (system temp dir if unset)
    pub work_root: Option<PathBuf>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            repo_prefix: DEFAULT_REPO_PREFIX.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            command_timeout: Duration::from_secs(120),
            work_root: None,
        }
    }
}

/// Code-generation agent options
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Agent command line; the prompt is appended as the final argument
    pub command: String,

    /// Deadline for one agent invocation
    pub timeout: Duration,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            command: "aider --message".to_string(),
            timeout: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
