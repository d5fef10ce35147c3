//! Engine orchestrator
//!
//! The per-job state machine and the poll loop around it. One iteration
//! claims a job, resolves its image, stages inputs into a scoped working
//! directory, runs the container, collects and submits outputs, tears the
//! container down, and reports a terminal status. Exactly one job is in
//! flight at a time.

use anyhow::{Context as AnyhowContext, Result};
use quern_client::CoordinatorClient;
use quern_core::dto::job::{ClaimFilter, StatusUpdate};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::context::{JobContext, Outcome};
use crate::docker::DockerCli;
use crate::staging::StagingArea;
use crate::{image, inputs, outputs};

/// Single-job worker loop
pub struct Engine {
    config: Config,
    client: Arc<CoordinatorClient>,
    docker: DockerCli,
    halt: Arc<AtomicBool>,
}

impl Engine {
    pub fn new(config: Config, client: Arc<CoordinatorClient>, halt: Arc<AtomicBool>) -> Self {
        Self {
            config,
            client,
            docker: DockerCli::new(),
            halt,
        }
    }

    /// Runs the poll loop until the halt flag is set.
    ///
    /// Cancellation contract: the flag is sampled only here, between
    /// iterations. An in-flight claim, container run, or upload always
    /// completes (or fails) before halt takes effect.
    pub async fn run(&self) -> Result<()> {
        info!(
            "starting poll loop (idle interval: {:?})",
            self.config.poll_interval
        );

        while !self.halt.load(Ordering::Relaxed) {
            let claimed = match self.client.next_job(&self.claim_filter()).await {
                Ok(claimed) => claimed,
                Err(e) => {
                    warn!("claim request failed: {e:#}");
                    None
                }
            };

            let Some(job) = claimed else {
                info!("waiting for work");
                time::sleep(self.config.poll_interval).await;
                continue;
            };

            info!(
                "JOB {:>6} - {} - {}/{} claimed",
                job.id, job.app.id, job.group, job.project.name
            );

            let mut ctx = JobContext::new(job);
            let outcome = self.process(&mut ctx).await;

            let update = StatusUpdate {
                status: outcome.status,
                activity: outcome.activity.clone(),
            };
            if let Err(e) = self.client.update_job(ctx.job.id, &update).await {
                error!("failed to report job {}: {e:#}", ctx.job.id);
            }

            info!(
                "JOB {:>6} - {} - {}/{}, {} {}",
                ctx.job.id,
                ctx.job.app.id,
                ctx.job.group,
                ctx.job.project.name,
                outcome.status,
                outcome.activity
            );
        }

        info!("halt observed - leaving poll loop");
        Ok(())
    }

    fn claim_filter(&self) -> ClaimFilter {
        ClaimFilter {
            group: self.config.group.clone(),
            project: self.config.project.clone(),
        }
    }

    /// Runs one job to a terminal outcome.
    ///
    /// Stage errors (input staging, submission, container plumbing) are
    /// caught here and become a `Failed` report with the error text as the
    /// activity; one bad job never stops the loop.
    async fn process(&self, ctx: &mut JobContext) -> Outcome {
        match self.run_job(ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("job {} failed: {e:#}", ctx.job.id);
                Outcome::failed(format!("{e:#}"))
            }
        }
    }

    async fn run_job(&self, ctx: &mut JobContext) -> Result<Outcome> {
        ctx.image_id = image::resolve(&self.docker, &self.client, &ctx.job).await;
        let Some(image_id) = ctx.image_id.clone() else {
            error!("could not load or download app");
            return Ok(Outcome::failed(format!(
                "could not load or download app {}",
                ctx.job.app.id
            )));
        };

        // The staging area lives for exactly this scope; dropping it at
        // the end removes the whole tree on every exit path.
        let staging = StagingArea::create()?;
        debug!("working in {}", staging.path().display());

        let staged = inputs::stage(&self.client, &ctx.job, &staging).await?;
        debug!("staged {} input file(s)", staged.files.len());

        let binds = staging.binds(&self.config.scratch_path);
        let container_id = self
            .docker
            .create(&image_id, &staged.command, &binds)
            .await?;
        ctx.container_id = Some(container_id.clone());

        let outcome = self.execute_and_collect(ctx, &staging, &container_id).await;

        // Teardown comes after output collection, on success and failure
        // alike, unless the operator asked to keep containers around.
        if let Some(id) = ctx.container_id.as_deref() {
            if self.config.keep_containers {
                info!("keeping container {id} for inspection");
            } else if let Err(e) = self.docker.remove(id).await {
                warn!("failed to remove container {id}: {e:#}");
            }
        }

        outcome
    }

    async fn execute_and_collect(
        &self,
        ctx: &JobContext,
        staging: &StagingArea,
        container_id: &str,
    ) -> Result<Outcome> {
        self.docker.start(container_id).await?;

        // Diagnostics only; a broken log stream never affects the outcome.
        if let Err(e) = self.docker.stream_stdout(container_id).await {
            warn!("log streaming ended early: {e:#}");
        }

        let exit_code = self.docker.wait(container_id).await?;
        debug!("container exited with code {exit_code}");

        let files = outputs::collect(&staging.output_dir())?;
        if let Some(outcome) = execution_outcome(exit_code, files.len()) {
            return Ok(outcome);
        }

        let manifest = outputs::build_manifest(&ctx.job, &files).await?;
        let route = ctx
            .job
            .outputs
            .first()
            .map(|o| o.url.as_str())
            .context("job produced files but declared no output expectations")?;

        self.client
            .submit_outputs(
                route,
                &manifest.files,
                manifest.metadata_json,
                manifest.sha_json,
            )
            .await
            .context("failed to submit outputs")?;

        let names: Vec<String> = files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        Ok(Outcome::done(format!("generated {names:?}")))
    }
}

/// Maps the execution result to a terminal outcome, or `None` when the
/// produced files should go on to submission. A non-zero exit code fails
/// the job regardless of what landed in the output directory.
fn execution_outcome(exit_code: i64, produced: usize) -> Option<Outcome> {
    if exit_code != 0 {
        error!("container had non-zero exit code, {exit_code}");
        return Some(Outcome::failed("Failed"));
    }
    if produced == 0 {
        return Some(Outcome::failed("no files were generated"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use quern_core::domain::job::JobStatus;

    #[test]
    fn nonzero_exit_fails_even_with_outputs_present() {
        let outcome = execution_outcome(1, 3).unwrap();
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.activity, "Failed");
    }

    #[test]
    fn zero_outputs_fail_with_explicit_activity() {
        let outcome = execution_outcome(0, 0).unwrap();
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.activity, "no files were generated");
    }

    #[test]
    fn clean_exit_with_outputs_proceeds_to_submission() {
        assert!(execution_outcome(0, 2).is_none());
    }
}
