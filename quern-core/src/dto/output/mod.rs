//! Output submission records
//!
//! One submission carries two JSON sidecar fields next to the binary file
//! parts: `metadata` (an array of [`ArtifactRecord`]) and `sha` (an array of
//! [`IntegrityEntry`], closed by a digest over the serialized metadata).

use serde::{Deserialize, Serialize};

/// Per-file metadata sent in the `metadata` field of a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub name: String,
    pub ext: String,
    pub kinds: Option<Vec<String>>,
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub kind_type: Option<String>,
    pub sha1: String,
    pub size: u64,
    pub flavor: String,
}

/// Entry in the `sha` integrity field.
///
/// File entries pair each uploaded name with its digest; the final entry
/// stamps the serialized metadata array itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntegrityEntry {
    File { name: String, sha1: String },
    Metadata { metadata: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_entries_keep_distinct_shapes() {
        let entries = vec![
            IntegrityEntry::File {
                name: "result.nii.gz".to_string(),
                sha1: "da39a3ee5e6b4b0d3255bfef95601890afd80709".to_string(),
            },
            IntegrityEntry::Metadata {
                metadata: "356a192b7913b04c54574d18c28d46e6395428ab".to_string(),
            },
        ];
        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json[0]["name"], "result.nii.gz");
        assert!(json[0].get("metadata").is_none());
        assert_eq!(
            json[1]["metadata"],
            "356a192b7913b04c54574d18c28d46e6395428ab"
        );
        assert!(json[1].get("name").is_none());
    }

    #[test]
    fn artifact_record_renames_type_field() {
        let record = ArtifactRecord {
            name: "scan".to_string(),
            ext: ".nii.gz".to_string(),
            kinds: Some(vec!["anatomy".to_string()]),
            state: Some("orig".to_string()),
            kind_type: Some("nifti".to_string()),
            sha1: "0".repeat(40),
            size: 1024,
            flavor: "file".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "nifti");
        assert!(json.get("kind_type").is_none());
    }
}
