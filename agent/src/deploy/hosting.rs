//! Hosting platform commands (`gh`)

use std::path::Path;

use secrecy::SecretString;
use serde::Serialize;

use crate::deploy::command::CommandSpec;
use crate::deploy::steps::PublishStep;
use crate::deploy::target::RepositoryTarget;

/// Build a non-interactive `gh` command authenticated with the operator token
fn gh(step: PublishStep, token: &SecretString) -> CommandSpec {
    CommandSpec::new(step, "gh")
        .secret_env("GH_TOKEN", token.clone())
        .env("GH_PROMPT_DISABLED", "1")
        .env("GH_NO_UPDATE_NOTIFIER", "1")
        .env("NO_COLOR", "1")
}

/// Create a public repository from a local source directory.
///
/// Fails if the repository already exists.
pub fn create_repository(
    target: &RepositoryTarget,
    source_dir: &Path,
    token: &SecretString,
) -> CommandSpec {
    gh(PublishStep::CreateRemote, token)
        .args(["repo", "create", &target.name, "--public", "--source"])
        .arg(source_dir.to_string_lossy())
        .args(["--remote", "origin"])
        .current_dir(source_dir)
}

#[derive(Debug, Serialize)]
struct PagesSource<'a> {
    branch: &'a str,
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct PagesRequest<'a> {
    source: PagesSource<'a>,
}

/// Body of the Pages creation request
pub fn pages_request_body(branch: &str) -> String {
    let request = PagesRequest {
        source: PagesSource { branch, path: "/" },
    };
    // Serializing two string fields cannot fail
    serde_json::to_string(&request).unwrap_or_default()
}

/// Enable static hosting from the root of `branch`
pub fn enable_pages(target: &RepositoryTarget, branch: &str, token: &SecretString) -> CommandSpec {
    gh(PublishStep::EnablePages, token)
        .args(["api", "-X", "POST"])
        .arg(target.pages_api_path())
        .args(["--input", "-"])
        .stdin(pages_request_body(branch))
}
