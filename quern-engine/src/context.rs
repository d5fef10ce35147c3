//! Per-iteration job context
//!
//! Each claimed job gets a fresh context that the pipeline stages pass
//! along and fill in; nothing about an iteration survives it. The engine
//! owns the context exclusively, so no locking is involved.

use quern_core::domain::job::{Job, JobStatus};

/// State accumulated while processing one job.
#[derive(Debug)]
pub struct JobContext {
    pub job: Job,
    /// Local image id, once resolved
    pub image_id: Option<String>,
    /// Container id, once created
    pub container_id: Option<String>,
}

impl JobContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            image_id: None,
            container_id: None,
        }
    }
}

/// Terminal outcome of one iteration, reported to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: JobStatus,
    pub activity: String,
}

impl Outcome {
    pub fn done(activity: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Done,
            activity: activity.into(),
        }
    }

    pub fn failed(activity: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            activity: activity.into(),
        }
    }
}
