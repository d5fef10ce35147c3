//! Job DTOs exchanged with the coordinator

use serde::{Deserialize, Serialize};

use crate::domain::job::JobStatus;

/// Scope filter sent when claiming the next job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimFilter {
    pub group: Option<String>,
    pub project: Option<String>,
}

/// Terminal status update for a processed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: JobStatus,
    pub activity: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_update_wire_shape() {
        let update = StatusUpdate {
            status: JobStatus::Done,
            activity: "generated [\"out.nii.gz\"]".to_string(),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["status"], "Done");
        assert_eq!(json["activity"], "generated [\"out.nii.gz\"]");
    }

    #[test]
    fn empty_claim_filter_serializes_null_scope() {
        let json = serde_json::to_value(ClaimFilter::default()).unwrap();
        assert!(json["group"].is_null());
        assert!(json["project"].is_null());
    }
}
