//! Code-generation agent invocation

use async_trait::async_trait;
use tracing::{debug, info};

use crate::app::options::AgentOptions;
use crate::deploy::command::{CommandRunner, CommandSpec, SystemRunner};
use crate::deploy::steps::PublishStep;
use crate::errors::PagesmithError;
use crate::filesys::workdir::WorkDir;

/// Produces raw agent output for a prompt
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, PagesmithError>;
}

/// Runs an external coding agent as a subprocess.
///
/// The configured command line is split on whitespace and the prompt is
/// appended as the last argument. The agent runs in a scratch directory
/// that is removed afterwards; only its stdout is kept.
#[derive(Debug, Clone)]
pub struct CommandAgent {
    program: String,
    args: Vec<String>,
    runner: SystemRunner,
}

impl CommandAgent {
    pub fn new(options: &AgentOptions) -> Result<Self, PagesmithError> {
        let mut parts = options.command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| {
            PagesmithError::ConfigError("agent command is empty".to_string())
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
            runner: SystemRunner::new(options.timeout),
        })
    }

    fn command(&self, prompt: &str, workdir: &WorkDir) -> CommandSpec {
        CommandSpec::new(PublishStep::Generate, self.program.as_str())
            .args(self.args.iter().cloned())
            .arg(prompt)
            .current_dir(workdir.path())
    }
}

#[async_trait]
impl CodeGenerator for CommandAgent {
    async fn generate(&self, prompt: &str) -> Result<String, PagesmithError> {
        let workdir = WorkDir::create("pagesmith-agent-", None)?;
        info!(
            "Invoking agent '{}' (timeout {:?})",
            self.program,
            self.runner.timeout()
        );

        let output = self
            .runner
            .run(&self.command(prompt, &workdir))
            .await
            .map_err(|e| match e {
                PagesmithError::PublishError { detail, .. } => {
                    PagesmithError::AgentInvocationError(detail)
                }
                other => other,
            })?;

        debug!("Agent produced {} bytes of output", output.stdout.len());
        Ok(output.stdout)
    }
}
