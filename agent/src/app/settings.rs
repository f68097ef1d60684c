//! Settings file management

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::app::options::{AgentOptions, PublishOptions, ServerOptions};
use crate::deploy::target::{Operator, DEFAULT_BRANCH, DEFAULT_REPO_PREFIX};
use crate::errors::PagesmithError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Pagesmith settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Account repositories are published under
    #[serde(default)]
    pub operator: OperatorSettings,

    /// Publish lifecycle configuration
    #[serde(default)]
    pub publish: PublishSettings,

    /// Code-generation agent configuration
    #[serde(default)]
    pub agent: AgentSettings,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,
}

/// Operator identity; the token only ever comes from the environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorSettings {
    #[serde(default)]
    pub user: String,

    #[serde(skip)]
    pub token: Option<SecretString>,
}

/// Publish lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
    #[serde(default = "default_repo_prefix")]
    pub repo_prefix: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    #[serde(default)]
    pub work_root: Option<PathBuf>,
}

fn default_repo_prefix() -> String {
    DEFAULT_REPO_PREFIX.to_string()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_command_timeout() -> u64 {
    120
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            repo_prefix: default_repo_prefix(),
            branch: default_branch(),
            command_timeout_secs: default_command_timeout(),
            work_root: None,
        }
    }
}

/// Agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_agent_command")]
    pub command: String,

    #[serde(default = "default_agent_timeout")]
    pub timeout_secs: u64,
}

fn default_agent_command() -> String {
    "aider --message".to_string()
}

fn default_agent_timeout() -> u64 {
    300
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            command: default_agent_command(),
            timeout_secs: default_agent_timeout(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Settings {
    /// Load settings from an optional JSON file, then apply the environment
    pub async fn load(path: Option<&str>) -> Result<Self, PagesmithError> {
        let settings = match path {
            Some(path) => {
                let file = File::new(path);
                if !file.exists().await {
                    return Err(PagesmithError::ConfigError(format!(
                        "settings file not found: {}",
                        path
                    )));
                }
                file.read_json::<Settings>().await?
            }
            None => Settings::default(),
        };
        Ok(settings.with_env(|key| std::env::var(key).ok()))
    }

    /// Apply `GITHUB_USER`, `GITHUB_TOKEN` and `AGENT_COMMAND` overrides
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(user) = non_empty("GITHUB_USER") {
            self.operator.user = user;
        }
        if let Some(token) = non_empty("GITHUB_TOKEN") {
            self.operator.token = Some(SecretString::from(token));
        }
        if let Some(command) = non_empty("AGENT_COMMAND") {
            self.agent.command = command;
        }
        self
    }

    /// Operator identity, required for publishing
    pub fn operator(&self) -> Result<Operator, PagesmithError> {
        let token = self.operator.token.clone().ok_or_else(|| {
            PagesmithError::ConfigError("operator token (GITHUB_TOKEN) is not set".to_string())
        })?;
        Operator::new(self.operator.user.clone(), token)
    }

    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            repo_prefix: self.publish.repo_prefix.clone(),
            branch: self.publish.branch.clone(),
            command_timeout: Duration::from_secs(self.publish.command_timeout_secs),
            work_root: self.publish.work_root.clone(),
        }
    }

    pub fn agent_options(&self) -> AgentOptions {
        AgentOptions {
            command: self.agent.command.clone(),
            timeout: Duration::from_secs(self.agent.timeout_secs),
        }
    }

    pub fn server_options(&self) -> ServerOptions {
        ServerOptions {
            host: self.server.host.clone(),
            port: self.server.port,
        }
    }
}
