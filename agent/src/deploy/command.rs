//! External command execution
//!
//! Every `git` and `gh` invocation goes through a [`CommandRunner`]. The
//! system runner enforces a deadline per command and kills the child when
//! the deadline passes. Secret arguments are redacted from every rendered
//! command line and from captured output.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::deploy::steps::PublishStep;
use crate::errors::PagesmithError;

const REDACTED: &str = "[REDACTED]";

/// A command argument or environment value
#[derive(Clone)]
pub enum Arg {
    Plain(String),
    Secret(SecretString),
}

impl Arg {
    fn expose(&self) -> &str {
        match self {
            Arg::Plain(value) => value,
            Arg::Secret(secret) => secret.expose_secret(),
        }
    }

    fn render(&self) -> &str {
        match self {
            Arg::Plain(value) => value,
            Arg::Secret(_) => REDACTED,
        }
    }
}

/// A fully described external command
#[derive(Clone)]
pub struct CommandSpec {
    pub step: PublishStep,
    pub program: String,
    pub args: Vec<Arg>,
    pub env: Vec<(String, Arg)>,
    pub cwd: Option<PathBuf>,
    pub stdin: Option<Vec<u8>>,
    /// Secrets that are not passed to the command but may show up in its output
    pub redactions: Vec<SecretString>,
}

impl CommandSpec {
    pub fn new(step: PublishStep, program: impl Into<String>) -> Self {
        Self {
            step,
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            stdin: None,
            redactions: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|a| Arg::Plain(a.into())));
        self
    }

    pub fn secret_arg(mut self, arg: SecretString) -> Self {
        self.args.push(Arg::Secret(arg));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), Arg::Plain(value.into())));
        self
    }

    pub fn secret_env(mut self, key: impl Into<String>, value: SecretString) -> Self {
        self.env.push((key.into(), Arg::Secret(value)));
        self
    }

    pub fn redacting(mut self, secret: &SecretString) -> Self {
        self.redactions.push(secret.clone());
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Command line with secrets replaced, safe for logs and errors
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(Arg::render))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Arguments as rendered by [`CommandSpec::display`]
    pub fn rendered_args(&self) -> Vec<&str> {
        self.args.iter().map(Arg::render).collect()
    }

    /// Remove every secret value from `text`
    pub fn redact(&self, text: &str) -> String {
        let secrets = self
            .args
            .iter()
            .chain(self.env.iter().map(|(_, v)| v))
            .filter_map(|arg| match arg {
                Arg::Secret(secret) => Some(secret.expose_secret()),
                Arg::Plain(_) => None,
            })
            .chain(self.redactions.iter().map(|s| s.expose_secret()))
            .filter(|secret| !secret.is_empty());

        let mut redacted = text.to_string();
        for secret in secrets {
            redacted = redacted.replace(secret, REDACTED);
        }
        redacted
    }

    fn failure(&self, detail: impl AsRef<str>) -> PagesmithError {
        PagesmithError::PublishError {
            step: self.step,
            command: self.display(),
            detail: self.redact(detail.as_ref()),
        }
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("step", &self.step)
            .field("command", &self.display())
            .field("cwd", &self.cwd)
            .finish()
    }
}

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion.
    ///
    /// A non-zero exit is an error; implementations never retry.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, PagesmithError>;
}

/// Runs commands as child processes of this one
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, PagesmithError> {
        debug!(step = %spec.step, "Running: {}", spec.display());

        let mut command = Command::new(&spec.program);
        command
            .args(spec.args.iter().map(Arg::expose))
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &spec.env {
            command.env(key, value.expose());
        }
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| spec.failure(format!("failed to spawn: {}", e)))?;

        // Feeding stdin counts against the deadline too
        let input = spec.stdin.clone();
        let stdin = child.stdin.take();
        let completion = async move {
            if let (Some(input), Some(mut stdin)) = (input, stdin) {
                if let Err(e) = stdin.write_all(&input).await {
                    let detail = format!("failed to write stdin: {}", e);
                    return Err(std::io::Error::new(e.kind(), detail));
                }
            }
            child.wait_with_output().await
        };

        // Dropping the future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(self.timeout, completion).await {
            Ok(result) => result.map_err(|e| spec.failure(e.to_string()))?,
            Err(_) => {
                return Err(PagesmithError::TimeoutError {
                    step: spec.step,
                    timeout: self.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            let detail = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                format!("exited with {}: {}", output.status, stderr)
            };
            return Err(spec.failure(detail));
        }

        Ok(CommandOutput { stdout, stderr })
    }
}
