//! Output collection and submission manifest
//!
//! After the container exits, the files it wrote to `/output` are
//! classified against the job's declared output expectations, hashed in
//! fixed-size chunks, and described by a metadata manifest plus an
//! integrity (`sha`) sidecar. The manifest is serialized exactly once;
//! its digest stamps the submission as a whole.

use anyhow::{Context, Result};
use quern_core::domain::job::{Job, OutputLabels};
use quern_core::dto::output::{ArtifactRecord, IntegrityEntry};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Read size for streaming hashes. Files are never loaded whole.
const HASH_CHUNK: usize = 1 << 20;

/// Everything the submission PUT needs: the files themselves and the two
/// pre-serialized sidecar fields.
#[derive(Debug, Clone)]
pub struct OutputManifest {
    pub files: Vec<PathBuf>,
    pub metadata_json: String,
    pub sha_json: String,
}

/// Lists the files produced in the output directory, sorted by name so a
/// given output set always yields the same manifest.
pub fn collect(output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(output_dir)
        .with_context(|| format!("failed to read output directory {}", output_dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Splits a file name into stem and extension.
///
/// `.nii.gz` names keep the compound extension intact; everything else
/// splits at the last dot. Dotless names and leading-dot names have no
/// extension.
pub fn split_name(file_name: &str) -> (String, String) {
    if let Some(stem) = file_name.strip_suffix(".nii.gz") {
        if !stem.is_empty() {
            return (stem.to_string(), ".nii.gz".to_string());
        }
    }
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (file_name[..idx].to_string(), file_name[idx..].to_string()),
        _ => (file_name.to_string(), String::new()),
    }
}

/// SHA-1 of a file, streamed in 1 MiB chunks.
pub async fn sha1_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .await
        .with_context(|| format!("failed to open {} for hashing", path.display()))?;

    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; HASH_CHUNK];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Builds the extension lookup from the job's output expectations.
///
/// First-declared wins on duplicate extensions.
pub fn expectation_map(job: &Job) -> HashMap<&str, &OutputLabels> {
    let mut map = HashMap::new();
    for spec in &job.outputs {
        map.entry(spec.payload.fext.as_str())
            .or_insert(&spec.payload);
    }
    map
}

/// Builds the submission manifest for the produced files.
///
/// Per file: split the name, hash the contents, look up the declared
/// labels for its extension. Files with no matching expectation are still
/// uploaded, with a warning and absent labels. The metadata array is
/// serialized once and its SHA-1 closes the integrity entries.
pub async fn build_manifest(job: &Job, files: &[PathBuf]) -> Result<OutputManifest> {
    let expectations = expectation_map(job);
    let mut records = Vec::with_capacity(files.len());
    let mut integrity = Vec::with_capacity(files.len() + 1);

    for path in files {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("unrepresentable output name: {}", path.display()))?;
        let (stem, ext) = split_name(file_name);

        let sha1 = sha1_file(path).await?;
        let size = std::fs::metadata(path)?.len();

        let labels = expectations.get(ext.as_str()).copied();
        match labels {
            Some(labels) => debug!(
                "{stem}{ext} is type: {:?}, kinds: {:?}",
                labels.kind_type, labels.kinds
            ),
            None => warn!("{stem}{ext} extension did not match an expected output"),
        }

        records.push(ArtifactRecord {
            name: stem,
            ext,
            kinds: labels.and_then(|l| l.kinds.clone()),
            state: labels.and_then(|l| l.state.clone()),
            kind_type: labels.and_then(|l| l.kind_type.clone()),
            sha1: sha1.clone(),
            size,
            flavor: "file".to_string(),
        });
        integrity.push(IntegrityEntry::File {
            name: file_name.to_string(),
            sha1,
        });
    }

    let metadata_json = serde_json::to_string(&records)?;
    let metadata_sha = hex::encode(Sha1::digest(metadata_json.as_bytes()));
    integrity.push(IntegrityEntry::Metadata {
        metadata: metadata_sha,
    });
    let sha_json = serde_json::to_string(&integrity)?;

    Ok(OutputManifest {
        files: files.to_vec(),
        metadata_json,
        sha_json,
    })
}
