//! Input staging
//!
//! Downloads each declared input artifact into the staging area and
//! derives the container command line from the staged file names.

use anyhow::{Context, Result};
use quern_client::CoordinatorClient;
use quern_core::domain::job::Job;
use std::path::PathBuf;
use tracing::debug;

use crate::staging::StagingArea;

/// The staged input files and the command line derived from them.
#[derive(Debug, Clone)]
pub struct StagedInputs {
    pub files: Vec<PathBuf>,
    /// Space-joined base names, in declaration order. The order is
    /// load-bearing: applications position-match their arguments.
    pub command: String,
}

/// Fetches every declared input into `<staging>/input`.
///
/// A failed download is fatal for the current job: it cannot run with
/// incomplete inputs, so the error propagates instead of retrying.
pub async fn stage(
    client: &CoordinatorClient,
    job: &Job,
    staging: &StagingArea,
) -> Result<StagedInputs> {
    debug!("fetching {} input(s)", job.inputs.len());

    let input_dir = staging.input_dir();
    let mut files = Vec::with_capacity(job.inputs.len());

    for input in &job.inputs {
        let path = client
            .fetch_input(&input.url, &input.payload, &input_dir)
            .await
            .with_context(|| format!("failed to fetch input {}", input.url))?;
        files.push(path);
    }

    let command = derive_command(&files);
    Ok(StagedInputs { files, command })
}

/// Space-joins the base names of the staged files, preserving order.
fn derive_command(files: &[PathBuf]) -> String {
    files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn command_uses_base_names_in_declaration_order() {
        let files = vec![
            PathBuf::from("/tmp/quern-x/input/t1.nii.gz"),
            PathBuf::from("/tmp/quern-x/input/params.json"),
            PathBuf::from("/tmp/quern-x/input/mask.nii.gz"),
        ];
        assert_eq!(derive_command(&files), "t1.nii.gz params.json mask.nii.gz");
    }

    #[test]
    fn command_never_leaks_host_paths() {
        let files = vec![Path::new("/var/tmp/staging/input/scan.nii.gz").to_path_buf()];
        let command = derive_command(&files);
        assert_eq!(command, "scan.nii.gz");
        assert!(!command.contains('/'));
    }

    #[test]
    fn no_inputs_yield_an_empty_command() {
        assert_eq!(derive_command(&[]), "");
    }
}
