//! Image resolution
//!
//! Determines the local image to run for a job's application. Resolution
//! never raises: every failure path yields `None`, which the engine maps
//! to a normal `Failed` report.

use quern_client::CoordinatorClient;
use quern_core::domain::job::Job;
use tracing::{debug, warn};

use crate::docker::DockerCli;

/// Resolves the job's `name:tag` application reference to a local image id.
///
/// Scans locally available images first. On a miss, asks the coordinator
/// for a build context as a fallback; building from context is not yet
/// implemented on either side, so that path currently ends in `None` too.
pub async fn resolve(docker: &DockerCli, client: &CoordinatorClient, job: &Job) -> Option<String> {
    let app_ref = &job.app.id;
    debug!("checking for existing image, {app_ref}");

    let Some((name, _tag)) = job.app.split() else {
        warn!("malformed app reference '{app_ref}', expected name:tag");
        return None;
    };

    let candidates = match docker.list_images(name).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("could not list local images: {e:#}");
            return None;
        }
    };

    for image in candidates {
        if image.reference == *app_ref {
            debug!("image found, id {}", image.id);
            return Some(image.id);
        }
    }

    debug!("image not found locally, requesting build context from coordinator");
    match client.app_build_context().await {
        Ok(Some(_context)) => {
            // TODO: build the image from the returned context once the
            // coordinator finishes the apps route.
            debug!("building from a downloaded context is not implemented");
        }
        Ok(None) => debug!("coordinator does not implement the apps route"),
        Err(e) => warn!("build context request failed: {e:#}"),
    }

    None
}
