//! Generate-then-publish pipeline

use async_trait::async_trait;
use tracing::{info, warn};

use crate::codegen::parser::parse_agent_output;
use crate::codegen::prompt::build_web_app_prompt;
use crate::codegen::runner::CodeGenerator;
use crate::deploy::command::CommandRunner;
use crate::deploy::publisher::{PublishRequest, Publisher};
use crate::deploy::round::Round;
use crate::errors::PagesmithError;
use crate::models::deployment::{DeployRequest, DeploymentResult};

/// Runs the agent for a task and publishes what it produced
pub struct Pipeline<G: CodeGenerator, R: CommandRunner> {
    generator: G,
    publisher: Publisher<R>,
}

impl<G: CodeGenerator, R: CommandRunner> Pipeline<G, R> {
    pub fn new(generator: G, publisher: Publisher<R>) -> Self {
        Self {
            generator,
            publisher,
        }
    }

    pub fn publisher(&self) -> &Publisher<R> {
        &self.publisher
    }

    /// Generate code for one round and publish it.
    ///
    /// The task lease is held from before the agent runs until the publish
    /// completes, so a concurrent request for the same task is rejected
    /// without spending an agent run.
    pub async fn deploy(&self, request: &DeployRequest) -> Result<DeploymentResult, PagesmithError> {
        let round = Round::new(request.round)?;
        request.task.validate_id()?;
        let lease = self.publisher.leases().try_acquire(&request.task.id)?;

        info!("Generating round {} for task {}", round, request.task.id);
        let prompt = build_web_app_prompt(&request.task, &request.attachments);
        let output = self.generator.generate(&prompt).await?;

        let files = parse_agent_output(&output);
        if files.is_empty() {
            warn!(
                "Agent output for task {} contained no html/css/js blocks",
                request.task.id
            );
        }

        let publish_request = PublishRequest {
            task: request.task.clone(),
            files,
            attachments: request.attachments.clone(),
            round: request.round,
        };
        self.publisher
            .publish_with_lease(&publish_request, &lease)
            .await
    }
}

/// Anything that can serve a deployment request
#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(&self, request: &DeployRequest) -> Result<DeploymentResult, PagesmithError>;
}

#[async_trait]
impl<G: CodeGenerator, R: CommandRunner> Deployer for Pipeline<G, R> {
    async fn deploy(&self, request: &DeployRequest) -> Result<DeploymentResult, PagesmithError> {
        Pipeline::deploy(self, request).await
    }
}
