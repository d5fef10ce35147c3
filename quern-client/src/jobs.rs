//! Job claim and status routes

use crate::CoordinatorClient;
use crate::error::Result;
use quern_core::domain::job::Job;
use quern_core::dto::job::{ClaimFilter, StatusUpdate};
use tracing::{debug, warn};

impl CoordinatorClient {
    /// Claim the next available job matching the scope filter.
    ///
    /// Absence of work is a normal outcome, not a failure: a non-success
    /// status yields `None` with a logged warning, and a success body that
    /// does not parse as a job (e.g., empty) also yields `None`. There is
    /// no retry here; the engine's idle sleep is the retry mechanism.
    pub async fn next_job(&self, filter: &ClaimFilter) -> Result<Option<Job>> {
        let url = format!("{}/jobs/next", self.base_url());
        debug!("requesting job from {url}");

        let response = self.client.get(&url).json(filter).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            );
            return Ok(None);
        }

        match response.json::<Job>().await {
            Ok(job) => {
                debug!(?job, "claimed job");
                Ok(Some(job))
            }
            // Empty or non-JSON body means no work was issued.
            Err(_) => Ok(None),
        }
    }

    /// Report the terminal status and activity for a job.
    ///
    /// Sent exactly once per processed job, as the last step of an
    /// iteration. A non-success response is an error.
    pub async fn update_job(&self, job_id: u64, update: &StatusUpdate) -> Result<()> {
        let url = format!("{}/jobs/{}", self.base_url(), job_id);
        debug!("updating job {job_id} status");

        let response = self.client.put(&url).json(update).send().await?;
        self.handle_empty_response(response).await
    }
}
