//! Repository lifecycle driver
//!
//! One call to [`Publisher::publish`] takes a task's generated files from a
//! scratch directory to a pushed commit with static hosting enabled:
//!
//! ```text
//! Create (round 1):  write -> init -> identity -> add -> commit -> branch -m
//!                    -> gh repo create -> set-url -> push -u -> enable pages
//! Update (round N):  clone -> write -> identity -> add -> commit -> push
//! Both:              rev-parse HEAD -> DeploymentResult
//! ```
//!
//! Any failed step aborts the run. Nothing is retried or rolled back. The
//! working directory and the task lease are released on every exit path.

use chrono::Utc;
use tracing::{error, info, info_span, warn, Instrument};

use crate::app::options::PublishOptions;
use crate::deploy::artifacts::{write_generated_files, write_metadata};
use crate::deploy::attachments::materialize_attachments;
use crate::deploy::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::deploy::fsm::{LifecycleEvent, LifecycleFsm, LifecycleState};
use crate::deploy::lease::{TaskLease, TaskLeases};
use crate::deploy::round::{Lifecycle, Round};
use crate::deploy::steps::PublishStep;
use crate::deploy::target::{Operator, RepositoryTarget};
use crate::deploy::{git, hosting};
use crate::errors::PagesmithError;
use crate::filesys::workdir::WorkDir;
use crate::models::deployment::DeploymentResult;
use crate::models::task::{Attachment, GeneratedFiles, Task};

const WORKDIR_PREFIX: &str = "pagesmith-";

/// Everything one publish run needs from the caller
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub task: Task,
    pub files: GeneratedFiles,
    pub attachments: Vec<Attachment>,
    /// Unvalidated round number
    pub round: i64,
}

/// Publishes generated sites to the operator's account
pub struct Publisher<R: CommandRunner> {
    runner: R,
    operator: Operator,
    options: PublishOptions,
    leases: TaskLeases,
}

impl<R: CommandRunner> Publisher<R> {
    pub fn new(runner: R, operator: Operator, options: PublishOptions) -> Self {
        Self {
            runner,
            operator,
            options,
            leases: TaskLeases::new(),
        }
    }

    /// Share a lease registry with other publishers in this process
    pub fn with_leases(mut self, leases: TaskLeases) -> Self {
        self.leases = leases;
        self
    }

    pub fn options(&self) -> &PublishOptions {
        &self.options
    }

    pub fn leases(&self) -> &TaskLeases {
        &self.leases
    }

    /// Repository a task publishes to
    pub fn target_for(&self, task_id: &str) -> RepositoryTarget {
        RepositoryTarget::derive(&self.options.repo_prefix, task_id, &self.operator)
    }

    /// Run the full create or update lifecycle for one round
    pub async fn publish(
        &self,
        request: &PublishRequest,
    ) -> Result<DeploymentResult, PagesmithError> {
        let round = Round::new(request.round)?;
        request.task.validate_id()?;
        let lease = self.leases.try_acquire(&request.task.id)?;
        self.publish_round(round, request, &lease).await
    }

    /// Like [`Publisher::publish`], for callers that already hold the
    /// task's lease (for example across code generation)
    pub async fn publish_with_lease(
        &self,
        request: &PublishRequest,
        lease: &TaskLease,
    ) -> Result<DeploymentResult, PagesmithError> {
        let round = Round::new(request.round)?;
        request.task.validate_id()?;
        if lease.task_id() != request.task.id {
            return Err(PagesmithError::ConfigError(format!(
                "lease is held for task '{}', not '{}'",
                lease.task_id(),
                request.task.id
            )));
        }
        self.publish_round(round, request, lease).await
    }

    async fn publish_round(
        &self,
        round: Round,
        request: &PublishRequest,
        _lease: &TaskLease,
    ) -> Result<DeploymentResult, PagesmithError> {
        let span = info_span!(
            "publish",
            task = %request.task.id,
            round = %round,
            run = %uuid::Uuid::new_v4(),
        );
        self.run_in_workdir(round, request).instrument(span).await
    }

    async fn run_in_workdir(
        &self,
        round: Round,
        request: &PublishRequest,
    ) -> Result<DeploymentResult, PagesmithError> {
        let target = self.target_for(&request.task.id);
        let workdir = WorkDir::create(WORKDIR_PREFIX, self.options.work_root.as_deref())?;

        let mut fsm = LifecycleFsm::new();
        transition(&mut fsm, LifecycleEvent::Begin);
        info!(
            "Publishing {} ({:?}) in {}",
            target.name,
            round.lifecycle(),
            workdir.path().display()
        );

        let result = self
            .run_lifecycle(round, &target, request, &workdir, &mut fsm)
            .await;

        if let Err(e) = &result {
            let step = e.failed_step().unwrap_or(PublishStep::Populate);
            transition(&mut fsm, LifecycleEvent::Fail(step, e.to_string()));
        }

        match (&result, fsm.state()) {
            (Ok(deployment), LifecycleState::Published) => {
                info!(
                    "Published {} at {} ({})",
                    target.name, deployment.commit_sha, deployment.pages_url
                );
            }
            (_, state) => {
                error!(
                    state = ?state,
                    step = ?fsm.failed_step(),
                    "Publishing {} ended: {}",
                    target.name,
                    fsm.summary()
                );
            }
        }

        result
    }

    async fn run_lifecycle(
        &self,
        round: Round,
        target: &RepositoryTarget,
        request: &PublishRequest,
        workdir: &WorkDir,
        fsm: &mut LifecycleFsm,
    ) -> Result<DeploymentResult, PagesmithError> {
        let dir = workdir.path();
        let branch = self.options.branch.as_str();
        let token = &self.operator.token;

        match round.lifecycle() {
            Lifecycle::Create => {
                self.populate(workdir, target, request).await?;
                transition(fsm, LifecycleEvent::Prepared);

                self.exec(git::init(dir)).await?;
                self.configure_identity(workdir).await?;
                self.exec(git::stage_all(dir)).await?;
                self.exec(git::commit(dir, &round.commit_message())).await?;
                self.exec(git::rename_branch(dir, branch)).await?;
                self.exec(hosting::create_repository(target, dir, token))
                    .await?;
                self.exec(git::set_push_url(
                    dir,
                    target.authenticated_url(&self.operator),
                ))
                .await?;
                self.exec(git::push_upstream(dir, branch, token)).await?;
                self.exec(hosting::enable_pages(target, branch, token))
                    .await?;
            }
            Lifecycle::Update => {
                self.exec(git::clone(
                    target.authenticated_url(&self.operator),
                    branch,
                    dir,
                ))
                .await?;
                self.populate(workdir, target, request).await?;
                transition(fsm, LifecycleEvent::Prepared);

                self.configure_identity(workdir).await?;
                self.exec(git::stage_all(dir)).await?;
                self.exec(git::commit(dir, &round.commit_message())).await?;
                self.exec(git::push(dir, token)).await?;
            }
        }
        transition(fsm, LifecycleEvent::Pushed);

        let revision = self.read_revision(workdir).await?;
        transition(fsm, LifecycleEvent::Finalized);

        Ok(DeploymentResult {
            repo_url: target.repo_url.clone(),
            commit_sha: revision,
            pages_url: target.pages_url.clone(),
            round: round.get(),
            deployed_at: Utc::now(),
        })
    }

    async fn populate(
        &self,
        workdir: &WorkDir,
        target: &RepositoryTarget,
        request: &PublishRequest,
    ) -> Result<(), PagesmithError> {
        write_generated_files(workdir, &request.files).await?;
        let written = materialize_attachments(workdir, &request.attachments).await?;
        // README and LICENSE always come from the task, never from the caller
        write_metadata(workdir, &target.name, &request.task).await?;
        info!(
            "Wrote {} generated files and {} attachments",
            request.files.len(),
            written.len()
        );
        Ok(())
    }

    async fn configure_identity(&self, workdir: &WorkDir) -> Result<(), PagesmithError> {
        for spec in git::configure_identity(
            workdir.path(),
            &self.operator.user,
            &self.operator.email(),
        ) {
            self.exec(spec).await?;
        }
        Ok(())
    }

    async fn read_revision(&self, workdir: &WorkDir) -> Result<String, PagesmithError> {
        let spec = git::rev_parse_head(workdir.path());
        let output = self.exec(spec.clone()).await?;
        let revision = output.stdout.trim().to_string();
        if !is_full_revision(&revision) {
            return Err(PagesmithError::PublishError {
                step: spec.step,
                command: spec.display(),
                detail: format!("unexpected revision id '{}'", revision),
            });
        }
        Ok(revision)
    }

    async fn exec(&self, spec: CommandSpec) -> Result<CommandOutput, PagesmithError> {
        info!(step = %spec.step, "{}", spec.display());
        self.runner.run(&spec).await
    }
}

/// Full SHA-1 or SHA-256 object id
fn is_full_revision(revision: &str) -> bool {
    matches!(revision.len(), 40 | 64) && revision.chars().all(|c| c.is_ascii_hexdigit())
}

fn transition(fsm: &mut LifecycleFsm, event: LifecycleEvent) {
    if let Err(e) = fsm.process(event) {
        warn!("{}", e);
    }
}
