//! Named steps of a publish run

use std::fmt;

use serde::{Deserialize, Serialize};

/// One external operation (or local stage) of a publish run.
///
/// Errors carry the step so an operator can tell exactly where a round
/// stopped without reading logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStep {
    /// Code-generation agent invocation
    Generate,
    /// Writing artifacts and attachments into the working directory
    Populate,
    Init,
    ConfigureIdentity,
    Stage,
    Commit,
    RenameBranch,
    CreateRemote,
    SetPushUrl,
    Clone,
    Push,
    EnablePages,
    ReadRevision,
}

impl PublishStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStep::Generate => "generate",
            PublishStep::Populate => "populate",
            PublishStep::Init => "init",
            PublishStep::ConfigureIdentity => "configure_identity",
            PublishStep::Stage => "stage",
            PublishStep::Commit => "commit",
            PublishStep::RenameBranch => "rename_branch",
            PublishStep::CreateRemote => "create_remote",
            PublishStep::SetPushUrl => "set_push_url",
            PublishStep::Clone => "clone",
            PublishStep::Push => "push",
            PublishStep::EnablePages => "enable_pages",
            PublishStep::ReadRevision => "read_revision",
        }
    }
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
