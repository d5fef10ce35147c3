//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of work claimed from the coordinator.
///
/// Describes which application to run, which artifacts to fetch before
/// execution, and how produced files should be classified on submission.
/// The worker discards the job once its terminal report is acknowledged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: u64,
    pub group: String,
    pub project: Project,
    pub app: AppRef,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<OutputSpec>,
}

/// Owning project of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
}

/// Application reference in `name:tag` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRef {
    #[serde(rename = "_id")]
    pub id: String,
}

impl AppRef {
    /// Splits the reference into image name and tag.
    ///
    /// Returns `None` for references without a tag separator.
    pub fn split(&self) -> Option<(&str, &str)> {
        self.id.split_once(':')
    }
}

/// One artifact to fetch into the staging area before execution.
///
/// The payload is opaque to the worker and passed through to the
/// coordinator unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    pub url: String,
    pub payload: serde_json::Value,
}

/// Declared expectation for a produced file, keyed by extension.
///
/// The first expectation whose `fext` equals a produced file's extension
/// supplies that file's classification labels. The first expectation's
/// `url` is also the upload route for the whole submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSpec {
    pub url: String,
    pub payload: OutputLabels,
}

/// Classification labels carried by an output expectation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputLabels {
    pub fext: String,
    pub kinds: Option<Vec<String>>,
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub kind_type: Option<String>,
}

/// Terminal status reported to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Done,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Done => write!(f, "Done"),
            JobStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_ref_splits_name_and_tag() {
        let app = AppRef {
            id: "scitran/dcm2nii:latest".to_string(),
        };
        assert_eq!(app.split(), Some(("scitran/dcm2nii", "latest")));
    }

    #[test]
    fn app_ref_without_tag_is_rejected() {
        let app = AppRef {
            id: "untagged".to_string(),
        };
        assert_eq!(app.split(), None);
    }

    #[test]
    fn job_parses_coordinator_payload() {
        let body = serde_json::json!({
            "_id": 42,
            "group": "unknown",
            "project": { "name": "Testing" },
            "app": { "_id": "dcm2nii:latest" },
            "inputs": [
                { "url": "files/dicom", "payload": { "acquisition": "a1" } }
            ],
            "outputs": [
                {
                    "url": "files/upload",
                    "payload": {
                        "fext": ".nii.gz",
                        "kinds": ["anatomy"],
                        "state": "orig",
                        "type": "nifti"
                    }
                }
            ]
        });

        let job: Job = serde_json::from_value(body).unwrap();
        assert_eq!(job.id, 42);
        assert_eq!(job.project.name, "Testing");
        assert_eq!(job.inputs.len(), 1);
        assert_eq!(job.outputs[0].payload.fext, ".nii.gz");
        assert_eq!(
            job.outputs[0].payload.kinds.as_deref(),
            Some(&["anatomy".to_string()][..])
        );
        assert_eq!(job.outputs[0].payload.kind_type.as_deref(), Some("nifti"));
    }

    #[test]
    fn status_displays_as_wire_label() {
        assert_eq!(JobStatus::Done.to_string(), "Done");
        assert_eq!(JobStatus::Failed.to_string(), "Failed");
        assert_eq!(serde_json::to_string(&JobStatus::Failed).unwrap(), "\"Failed\"");
    }
}
