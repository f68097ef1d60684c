//! Publisher lifecycle tests

use std::collections::BTreeMap;

use pagesmith::app::options::PublishOptions;
use pagesmith::deploy::artifacts::{render_readme, LICENSE_FILE, LICENSE_TEXT, README_FILE};
use pagesmith::deploy::publisher::{PublishRequest, Publisher};
use pagesmith::deploy::steps::PublishStep;
use pagesmith::errors::PagesmithError;
use pagesmith::models::task::{Attachment, GeneratedFiles};
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use crate::support::{entry_count, operator, task, CapturedLogs, ScriptedRunner, REVISION, TOKEN};

fn publisher(runner: &ScriptedRunner, work_root: &TempDir) -> Publisher<ScriptedRunner> {
    let options = PublishOptions {
        work_root: Some(work_root.path().to_path_buf()),
        ..Default::default()
    };
    Publisher::new(runner.clone(), operator(), options)
}

fn files(html: &str) -> GeneratedFiles {
    BTreeMap::from([
        ("index.html".to_string(), html.to_string()),
        ("styles.css".to_string(), "body { margin: 0; }".to_string()),
    ])
}

fn request(round: i64, html: &str) -> PublishRequest {
    PublishRequest {
        task: task("task-1"),
        files: files(html),
        attachments: Vec::new(),
        round,
    }
}

#[tokio::test]
async fn test_create_round_runs_full_lifecycle() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let publisher = publisher(&runner, &work_root);

    let result = assert_ok!(publisher.publish(&request(1, "<h1>v1</h1>")).await);

    assert_eq!(
        runner.steps(),
        vec![
            PublishStep::Init,
            PublishStep::ConfigureIdentity,
            PublishStep::ConfigureIdentity,
            PublishStep::Stage,
            PublishStep::Commit,
            PublishStep::RenameBranch,
            PublishStep::CreateRemote,
            PublishStep::SetPushUrl,
            PublishStep::Push,
            PublishStep::EnablePages,
            PublishStep::ReadRevision,
        ]
    );
    assert_eq!(result.repo_url, "https://github.com/octo/llm-deploy-task-1");
    assert_eq!(result.pages_url, "https://octo.github.io/llm-deploy-task-1/");
    assert_eq!(result.commit_sha, REVISION);
    assert_eq!(result.round, 1);

    let calls = runner.calls();
    assert!(calls[4].display.ends_with("commit -m Initial commit"));
    assert!(calls[6].display.contains("repo create llm-deploy-task-1 --public"));
    assert!(calls[8].display.ends_with("push -u origin main"));

    let committed = runner.committed();
    assert!(committed.contains_key("README.md"));
    assert!(committed.contains_key("LICENSE"));
    assert_eq!(runner.committed_text("index.html").unwrap(), "<h1>v1</h1>");
    assert!(runner
        .committed_text("README.md")
        .unwrap()
        .contains("A page that shows a counter"));
}

#[tokio::test]
async fn test_token_never_rendered() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let publisher = publisher(&runner, &work_root);

    assert_ok!(publisher.publish(&request(1, "<p></p>")).await);

    let calls = runner.calls();
    assert!(calls.iter().all(|c| !c.display.contains(TOKEN)));
    let set_url = calls
        .iter()
        .find(|c| c.step == PublishStep::SetPushUrl)
        .unwrap();
    assert!(set_url.display.contains("[REDACTED]"));
}

#[tokio::test]
async fn test_update_round_preserves_existing_files() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new()
        .with_remote_file("index.html", b"<h1>v1</h1>")
        .with_remote_file("assets/old.txt", b"kept");
    let publisher = publisher(&runner, &work_root);

    let result = assert_ok!(publisher.publish(&request(2, "<h1>v2</h1>")).await);

    assert_eq!(
        runner.steps(),
        vec![
            PublishStep::Clone,
            PublishStep::ConfigureIdentity,
            PublishStep::ConfigureIdentity,
            PublishStep::Stage,
            PublishStep::Commit,
            PublishStep::Push,
            PublishStep::ReadRevision,
        ]
    );
    assert_eq!(result.round, 2);

    let calls = runner.calls();
    assert!(calls[0].cwd.is_none());
    assert!(calls[0].display.starts_with("git clone --branch main [REDACTED]"));
    assert!(calls[4].display.ends_with("commit -m Round 2 update"));
    assert_eq!(calls[5].display, "git push");

    assert_eq!(runner.committed_text("index.html").unwrap(), "<h1>v2</h1>");
    assert_eq!(runner.committed_text("assets/old.txt").unwrap(), "kept");
    assert!(runner.committed().contains_key("README.md"));
}

#[tokio::test]
async fn test_push_failure_cleans_up() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new().failing_at(PublishStep::Push);
    let publisher = publisher(&runner, &work_root);

    let err = assert_err!(publisher.publish(&request(1, "<p></p>")).await);

    assert!(matches!(
        err,
        PagesmithError::PublishError {
            step: PublishStep::Push,
            ..
        }
    ));
    assert_eq!(runner.steps().last(), Some(&PublishStep::Push));
    assert_eq!(entry_count(work_root.path()), 0);
    assert!(!publisher.leases().is_held("task-1"));
}

#[tokio::test]
async fn test_final_lifecycle_state_is_logged() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new().failing_at(PublishStep::EnablePages);
    let publisher = publisher(&runner, &work_root);
    assert_err!(publisher.publish(&request(1, "<p></p>")).await);

    let output = logs.contents();
    assert!(output.contains("ended: failed at enable_pages"), "{output}");
    assert!(output.contains("state=Failed"), "{output}");
    assert!(!output.contains(TOKEN));
}

#[tokio::test]
async fn test_invalid_round_runs_nothing() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let publisher = publisher(&runner, &work_root);

    for round in [0, -3] {
        let err = assert_err!(publisher.publish(&request(round, "<p></p>")).await);
        assert!(matches!(err, PagesmithError::ConfigError(_)));
    }
    assert!(runner.calls().is_empty());
    assert_eq!(entry_count(work_root.path()), 0);
}

#[tokio::test]
async fn test_invalid_task_id_runs_nothing() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let publisher = publisher(&runner, &work_root);

    let mut req = request(1, "<p></p>");
    req.task.id = "bad/id".to_string();
    let err = assert_err!(publisher.publish(&req).await);
    assert!(matches!(err, PagesmithError::ConfigError(_)));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_concurrent_run_for_same_task_is_rejected() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let publisher = publisher(&runner, &work_root);

    let held = assert_ok!(publisher.leases().try_acquire("task-1"));
    let err = assert_err!(publisher.publish(&request(1, "<p></p>")).await);
    assert!(matches!(err, PagesmithError::LeaseConflict(ref id) if id == "task-1"));
    assert!(runner.calls().is_empty());

    drop(held);
    assert_ok!(publisher.publish(&request(1, "<p></p>")).await);
}

#[tokio::test]
async fn test_attachments_written_before_commit() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let publisher = publisher(&runner, &work_root);

    let mut req = request(1, "<p></p>");
    req.attachments = vec![
        Attachment {
            name: "data/bytes.bin".to_string(),
            url: "data:application/octet-stream;base64,AQID".to_string(),
        },
        Attachment {
            name: "remote.png".to_string(),
            url: "https://example.com/remote.png".to_string(),
        },
    ];
    assert_ok!(publisher.publish(&req).await);

    let committed = runner.committed();
    assert_eq!(committed.get("data/bytes.bin"), Some(&vec![1u8, 2, 3]));
    assert!(!committed.contains_key("remote.png"));
}

#[tokio::test]
async fn test_attachments_cannot_replace_readme_or_license() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let publisher = publisher(&runner, &work_root);

    let mut req = request(1, "<p></p>");
    req.files
        .insert(README_FILE.to_string(), "agent readme".to_string());
    req.attachments = vec![
        Attachment {
            name: README_FILE.to_string(),
            url: "data:text/plain,caller readme".to_string(),
        },
        Attachment {
            name: LICENSE_FILE.to_string(),
            url: "data:text/plain,proprietary".to_string(),
        },
    ];
    assert_ok!(publisher.publish(&req).await);

    assert_eq!(
        runner.committed_text(README_FILE).unwrap(),
        render_readme("llm-deploy-task-1", &req.task)
    );
    assert_eq!(runner.committed_text(LICENSE_FILE).unwrap(), LICENSE_TEXT);
}

#[tokio::test]
async fn test_escaping_attachment_fails_before_any_command() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let publisher = publisher(&runner, &work_root);

    let mut req = request(1, "<p></p>");
    req.attachments = vec![Attachment {
        name: "../escape.txt".to_string(),
        url: "data:text/plain,hi".to_string(),
    }];
    let err = assert_err!(publisher.publish(&req).await);
    assert!(matches!(err, PagesmithError::MaterializationError { .. }));
    assert!(runner.calls().is_empty());
    assert_eq!(entry_count(work_root.path()), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_cloned_symlink_cannot_redirect_attachment() {
    let work_root = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new().with_remote_symlink("assets", outside.path());
    let publisher = publisher(&runner, &work_root);

    let mut req = request(2, "<p></p>");
    req.attachments = vec![Attachment {
        name: "assets/pwned.txt".to_string(),
        url: "data:text/plain,x".to_string(),
    }];
    let err = assert_err!(publisher.publish(&req).await);

    assert!(matches!(err, PagesmithError::MaterializationError { .. }));
    assert!(!outside.path().join("pwned.txt").exists());
    assert_eq!(runner.steps(), vec![PublishStep::Clone]);
    assert_eq!(entry_count(work_root.path()), 0);
}

#[tokio::test]
async fn test_short_revision_is_rejected() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new().with_revision("abc1234");
    let publisher = publisher(&runner, &work_root);

    let err = assert_err!(publisher.publish(&request(1, "<p></p>")).await);
    assert_eq!(err.failed_step(), Some(PublishStep::ReadRevision));
}

#[test]
fn test_target_is_deterministic() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let publisher = publisher(&runner, &work_root);

    assert_eq!(publisher.target_for("abc"), publisher.target_for("abc"));
    assert_eq!(publisher.target_for("abc").name, "llm-deploy-abc");
}
