//! Git commands used by the publish lifecycle

use std::path::Path;

use secrecy::SecretString;

use crate::deploy::command::CommandSpec;
use crate::deploy::steps::PublishStep;

fn git(step: PublishStep, repo_dir: &Path) -> CommandSpec {
    CommandSpec::new(step, "git").current_dir(repo_dir)
}

pub fn init(repo_dir: &Path) -> CommandSpec {
    git(PublishStep::Init, repo_dir).arg("init")
}

/// Set committer name and email, local to the repository
pub fn configure_identity(repo_dir: &Path, name: &str, email: &str) -> [CommandSpec; 2] {
    [
        git(PublishStep::ConfigureIdentity, repo_dir).args(["config", "user.name", name]),
        git(PublishStep::ConfigureIdentity, repo_dir).args(["config", "user.email", email]),
    ]
}

pub fn stage_all(repo_dir: &Path) -> CommandSpec {
    git(PublishStep::Stage, repo_dir).args(["add", "."])
}

pub fn commit(repo_dir: &Path, message: &str) -> CommandSpec {
    git(PublishStep::Commit, repo_dir).args(["commit", "-m", message])
}

pub fn rename_branch(repo_dir: &Path, branch: &str) -> CommandSpec {
    git(PublishStep::RenameBranch, repo_dir).args(["branch", "-m", branch])
}

pub fn set_push_url(repo_dir: &Path, remote_url: SecretString) -> CommandSpec {
    git(PublishStep::SetPushUrl, repo_dir)
        .args(["remote", "set-url", "origin"])
        .secret_arg(remote_url)
}

/// First push, establishing upstream tracking
pub fn push_upstream(repo_dir: &Path, branch: &str, token: &SecretString) -> CommandSpec {
    git(PublishStep::Push, repo_dir)
        .args(["push", "-u", "origin", branch])
        .redacting(token)
}

/// Push to the already tracked upstream
pub fn push(repo_dir: &Path, token: &SecretString) -> CommandSpec {
    git(PublishStep::Push, repo_dir).arg("push").redacting(token)
}

/// Clone into `target_dir`, which must be empty
pub fn clone(remote_url: SecretString, branch: &str, target_dir: &Path) -> CommandSpec {
    CommandSpec::new(PublishStep::Clone, "git")
        .args(["clone", "--branch", branch])
        .secret_arg(remote_url)
        .arg(target_dir.to_string_lossy())
}

pub fn rev_parse_head(repo_dir: &Path) -> CommandSpec {
    git(PublishStep::ReadRevision, repo_dir).args(["rev-parse", "HEAD"])
}
