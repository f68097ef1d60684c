//! Generate-then-publish pipeline tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pagesmith::app::options::PublishOptions;
use pagesmith::app::pipeline::Pipeline;
use pagesmith::codegen::runner::CodeGenerator;
use pagesmith::deploy::publisher::Publisher;
use pagesmith::deploy::steps::PublishStep;
use pagesmith::errors::PagesmithError;
use pagesmith::models::deployment::DeployRequest;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use crate::support::{operator, task, ScriptedRunner};

const AGENT_OUTPUT: &str = "Here is the app.

```html
<!DOCTYPE html><html><body><button>+1</button></body></html>
```

```css
button { color: red; }
```

```js
console.log('ready');
```
";

/// Generator that returns canned output and remembers the prompts it saw
#[derive(Clone, Default)]
struct CannedGenerator {
    output: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl CodeGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, PagesmithError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.output
            .clone()
            .ok_or_else(|| PagesmithError::AgentInvocationError("agent exited with 1".to_string()))
    }
}

fn pipeline(
    generator: CannedGenerator,
    runner: &ScriptedRunner,
    work_root: &TempDir,
) -> Pipeline<CannedGenerator, ScriptedRunner> {
    let options = PublishOptions {
        work_root: Some(work_root.path().to_path_buf()),
        ..Default::default()
    };
    Pipeline::new(generator, Publisher::new(runner.clone(), operator(), options))
}

fn deploy_request(round: i64) -> DeployRequest {
    DeployRequest {
        task: task("counter"),
        round,
        attachments: Vec::new(),
    }
}

#[tokio::test]
async fn test_generated_files_are_published() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let generator = CannedGenerator {
        output: Some(AGENT_OUTPUT.to_string()),
        ..Default::default()
    };
    let pipeline = pipeline(generator.clone(), &runner, &work_root);

    let result = assert_ok!(pipeline.deploy(&deploy_request(1)).await);
    assert_eq!(result.repo_url, "https://github.com/octo/llm-deploy-counter");

    assert_eq!(
        runner.committed_text("index.html").unwrap(),
        "<!DOCTYPE html><html><body><button>+1</button></body></html>"
    );
    assert_eq!(
        runner.committed_text("styles.css").unwrap(),
        "button { color: red; }"
    );
    assert_eq!(
        runner.committed_text("script.js").unwrap(),
        "console.log('ready');"
    );

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("A page that shows a counter"));
    assert!(prompts[0].contains("Page has a button"));
}

#[tokio::test]
async fn test_agent_failure_publishes_nothing() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let pipeline = pipeline(CannedGenerator::default(), &runner, &work_root);

    let err = assert_err!(pipeline.deploy(&deploy_request(1)).await);
    assert!(matches!(err, PagesmithError::AgentInvocationError(_)));
    assert!(runner.calls().is_empty());
    assert!(!pipeline.publisher().leases().is_held("counter"));
}

#[tokio::test]
async fn test_invalid_round_skips_agent() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new();
    let generator = CannedGenerator {
        output: Some(AGENT_OUTPUT.to_string()),
        ..Default::default()
    };
    let pipeline = pipeline(generator.clone(), &runner, &work_root);

    let err = assert_err!(pipeline.deploy(&deploy_request(0)).await);
    assert!(matches!(err, PagesmithError::ConfigError(_)));
    assert!(generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_round_through_pipeline() {
    let work_root = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new().with_remote_file("index.html", b"old");
    let generator = CannedGenerator {
        output: Some(AGENT_OUTPUT.to_string()),
        ..Default::default()
    };
    let pipeline = pipeline(generator, &runner, &work_root);

    let result = assert_ok!(pipeline.deploy(&deploy_request(3)).await);
    assert_eq!(result.round, 3);
    assert_eq!(runner.steps().first(), Some(&PublishStep::Clone));
    assert_ne!(runner.committed_text("index.html").unwrap(), "old");
}
