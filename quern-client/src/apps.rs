//! Application build-context route

use crate::CoordinatorClient;
use crate::error::Result;
use tracing::debug;

impl CoordinatorClient {
    /// Fetch the build context for applications missing locally.
    ///
    /// Fallback path for the image resolver. The coordinator side of this
    /// route may not be implemented; a non-success status yields `None`
    /// rather than an error.
    pub async fn app_build_context(&self) -> Result<Option<serde_json::Value>> {
        let url = format!("{}/apps", self.base_url());
        debug!("requesting build context from {url}");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            debug!("coordinator does not serve build contexts");
            return Ok(None);
        }

        match response.json().await {
            Ok(context) => Ok(Some(context)),
            Err(_) => Ok(None),
        }
    }
}
