//! Task models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::PagesmithError;

/// Generated files keyed by their canonical filename
pub type GeneratedFiles = BTreeMap<String, String>;

/// One deployment request as described by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier, the same for every round of one project
    pub id: String,

    /// Natural-language application brief
    pub brief: String,

    /// Checks the generated application is expected to pass
    #[serde(default)]
    pub checks: Vec<String>,
}

impl Task {
    /// Reject identifiers that cannot be embedded in a repository name.
    ///
    /// GitHub repository names allow ASCII letters, digits, `.`, `-` and `_`.
    pub fn validate_id(&self) -> Result<(), PagesmithError> {
        if self.id.is_empty() {
            return Err(PagesmithError::ConfigError("task id is empty".to_string()));
        }
        if let Some(c) = self
            .id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(PagesmithError::ConfigError(format!(
                "task id '{}' contains unsupported character '{}'",
                self.id, c
            )));
        }
        Ok(())
    }
}

/// A caller-supplied asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Relative filename inside the published repository
    pub name: String,

    /// Either a `data:` URI or an external reference
    pub url: String,
}
