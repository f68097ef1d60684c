//! Shared test doubles

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;
use tracing_subscriber::fmt::MakeWriter;

use pagesmith::deploy::command::{CommandOutput, CommandRunner, CommandSpec};
use pagesmith::deploy::steps::PublishStep;
use pagesmith::deploy::target::Operator;
use pagesmith::errors::PagesmithError;
use pagesmith::models::task::Task;

pub const TOKEN: &str = "ghp_testsecret123";
pub const REVISION: &str = "0123456789abcdef0123456789abcdef01234567";

/// One command the publisher asked for
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub step: PublishStep,
    pub display: String,
    pub cwd: Option<PathBuf>,
}

#[derive(Default)]
struct Script {
    calls: Vec<RecordedCall>,
    fail_at: Option<PublishStep>,
    revision: Option<String>,
    remote_files: Vec<(String, Vec<u8>)>,
    remote_links: Vec<(String, PathBuf)>,
    committed: BTreeMap<String, Vec<u8>>,
}

/// Command runner that records every call instead of spawning processes.
///
/// A clone writes `remote_files` into the target directory and a commit
/// snapshots the working directory, so tests can assert on what would have
/// been pushed.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(self, step: PublishStep) -> Self {
        self.script.lock().unwrap().fail_at = Some(step);
        self
    }

    pub fn with_revision(self, revision: &str) -> Self {
        self.script.lock().unwrap().revision = Some(revision.to_string());
        self
    }

    pub fn with_remote_file(self, name: &str, contents: &[u8]) -> Self {
        self.script
            .lock()
            .unwrap()
            .remote_files
            .push((name.to_string(), contents.to_vec()));
        self
    }

    /// A symbolic link the simulated clone checks out
    pub fn with_remote_symlink(self, name: &str, target: &Path) -> Self {
        self.script
            .lock()
            .unwrap()
            .remote_links
            .push((name.to_string(), target.to_path_buf()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn steps(&self) -> Vec<PublishStep> {
        self.calls().into_iter().map(|c| c.step).collect()
    }

    pub fn committed(&self) -> BTreeMap<String, Vec<u8>> {
        self.script.lock().unwrap().committed.clone()
    }

    pub fn committed_text(&self, name: &str) -> Option<String> {
        self.committed()
            .get(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, PagesmithError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(RecordedCall {
            step: spec.step,
            display: spec.display(),
            cwd: spec.cwd.clone(),
        });

        if script.fail_at == Some(spec.step) {
            return Err(PagesmithError::PublishError {
                step: spec.step,
                command: spec.display(),
                detail: "scripted failure".to_string(),
            });
        }

        let mut output = CommandOutput::default();
        match spec.step {
            PublishStep::Clone => {
                let target = PathBuf::from(spec.rendered_args().last().copied().unwrap_or("."));
                for (name, contents) in &script.remote_files {
                    let path = target.join(name);
                    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                    std::fs::write(path, contents).unwrap();
                }
                #[cfg(unix)]
                for (name, link_target) in &script.remote_links {
                    std::os::unix::fs::symlink(link_target, target.join(name)).unwrap();
                }
            }
            PublishStep::Commit => {
                let dir = spec.cwd.clone().unwrap();
                script.committed = snapshot(&dir);
            }
            PublishStep::ReadRevision => {
                let revision = script.revision.clone().unwrap_or_else(|| REVISION.to_string());
                output.stdout = format!("{}\n", revision);
            }
            _ => {}
        }
        Ok(output)
    }
}

fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if path.is_dir() {
                if entry.file_name() != ".git" {
                    pending.push(path);
                }
            } else {
                let relative = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                files.insert(relative, std::fs::read(&path).unwrap());
            }
        }
    }
    files
}

pub fn operator() -> Operator {
    Operator::new("octo", SecretString::from(TOKEN)).unwrap()
}

pub fn task(id: &str) -> Task {
    Task {
        id: id.to_string(),
        brief: "A page that shows a counter".to_string(),
        checks: vec!["Page has a button".to_string()],
    }
}

/// Number of entries left in a directory
pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Log sink for asserting on what a run reported
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Install as the thread's default subscriber until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
