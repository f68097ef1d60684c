//! Repository target derivation
//!
//! Repository identity is a pure function of the task id and the operator.
//! Later rounds find the repository created by round 1 through this
//! derivation alone, so repositories must never be renamed out-of-band.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::errors::PagesmithError;

pub const DEFAULT_REPO_PREFIX: &str = "llm-deploy";
pub const DEFAULT_BRANCH: &str = "main";

/// The account repositories are published under
#[derive(Clone)]
pub struct Operator {
    pub user: String,
    pub token: SecretString,
}

impl Operator {
    /// Build an operator identity, failing if either part is missing
    pub fn new(user: impl Into<String>, token: SecretString) -> Result<Self, PagesmithError> {
        let user = user.into();
        if user.trim().is_empty() {
            return Err(PagesmithError::ConfigError(
                "operator user (GITHUB_USER) is not set".to_string(),
            ));
        }
        if token.expose_secret().trim().is_empty() {
            return Err(PagesmithError::ConfigError(
                "operator token (GITHUB_TOKEN) is not set".to_string(),
            ));
        }
        Ok(Self { user, token })
    }

    /// Committer email derived from the operator account
    pub fn email(&self) -> String {
        format!("{}@users.noreply.github.com", self.user)
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Where a task's site lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    pub owner: String,
    pub name: String,
    pub repo_url: String,
    pub pages_url: String,
}

impl RepositoryTarget {
    pub fn derive(prefix: &str, task_id: &str, operator: &Operator) -> Self {
        let name = repository_name(prefix, task_id);
        Self {
            repo_url: format!("https://github.com/{}/{}", operator.user, name),
            pages_url: format!("https://{}.github.io/{}/", operator.user, name),
            owner: operator.user.clone(),
            name,
        }
    }

    /// Remote URL with the operator token embedded, for clone and push.
    ///
    /// The result is a secret and must never be logged.
    pub fn authenticated_url(&self, operator: &Operator) -> SecretString {
        SecretString::from(format!(
            "https://{}@github.com/{}/{}.git",
            operator.token.expose_secret(),
            self.owner,
            self.name
        ))
    }

    /// `gh api` path of the Pages resource
    pub fn pages_api_path(&self) -> String {
        format!("/repos/{}/{}/pages", self.owner, self.name)
    }
}

pub fn repository_name(prefix: &str, task_id: &str) -> String {
    format!("{}-{}", prefix, task_id)
}
