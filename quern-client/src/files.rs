//! File transfer routes: input staging and output submission

use crate::CoordinatorClient;
use crate::error::{ClientError, Result};
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

impl CoordinatorClient {
    /// Download one input artifact into `dest_dir`.
    ///
    /// The descriptor payload is passed through as the request body. The
    /// destination file name comes from the response's Content-Disposition
    /// attachment filename; bytes are streamed to disk. A non-success
    /// status is an error: the job cannot run with incomplete inputs.
    ///
    /// Returns the path of the written file.
    pub async fn fetch_input(
        &self,
        route: &str,
        payload: &serde_json::Value,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        let url = self.route_url(route);
        debug!("fetching input from {url}");

        let mut response = self.client.get(&url).json(payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ClientError::api(status.as_u16(), message));
        }

        let name = attachment_filename(response.headers()).ok_or(ClientError::MissingFilename)?;
        let path = dest_dir.join(&name);

        let mut file = File::create(&path).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("{} downloaded", path.display());
        Ok(path)
    }

    /// Upload produced files plus their sidecar fields in one multipart PUT.
    ///
    /// Each file becomes a binary part keyed by its own base name; the
    /// `metadata` and `sha` fields carry the pre-serialized record arrays.
    /// They arrive as strings so the digest computed over `metadata` by the
    /// caller covers the exact bytes sent.
    pub async fn submit_outputs(
        &self,
        route: &str,
        files: &[PathBuf],
        metadata_json: String,
        sha_json: String,
    ) -> Result<()> {
        let mut form = Form::new();

        for path in files {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    ClientError::Config(format!("unrepresentable file name: {}", path.display()))
                })?
                .to_string();

            let file = File::open(path).await?;
            let body = Body::wrap_stream(ReaderStream::new(file));
            let part = Part::stream(body)
                .file_name(name.clone())
                .mime_str("application/octet-stream")?;
            form = form.part(name, part);
        }

        form = form.text("metadata", metadata_json).text("sha", sha_json);

        let url = self.route_url(route);
        debug!("submitting outputs to {url}");

        let response = self.client.put(&url).multipart(form).send().await?;
        self.handle_empty_response(response).await
    }
}

/// Extract the attachment filename from a Content-Disposition header.
///
/// Names that would escape the destination directory are rejected.
fn attachment_filename(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let raw = headers
        .get(reqwest::header::CONTENT_DISPOSITION)?
        .to_str()
        .ok()?;

    let name = raw
        .strip_prefix("attachment; filename=")?
        .trim_matches('"')
        .trim();

    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{CONTENT_DISPOSITION, HeaderMap, HeaderValue};

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_DISPOSITION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn filename_is_taken_from_attachment_header() {
        let headers = headers_with("attachment; filename=t1.nii.gz");
        assert_eq!(attachment_filename(&headers).as_deref(), Some("t1.nii.gz"));
    }

    #[test]
    fn quoted_filename_is_unquoted() {
        let headers = headers_with("attachment; filename=\"t1.nii.gz\"");
        assert_eq!(attachment_filename(&headers).as_deref(), Some("t1.nii.gz"));
    }

    #[test]
    fn missing_header_yields_none() {
        assert_eq!(attachment_filename(&HeaderMap::new()), None);
    }

    #[test]
    fn traversal_names_are_rejected() {
        for bad in [
            "attachment; filename=../../etc/passwd",
            "attachment; filename=/etc/passwd",
            "attachment; filename=",
        ] {
            assert_eq!(attachment_filename(&headers_with(bad)), None, "{bad}");
        }
    }
}
