use super::client::{backend_error_message, HttpUploadClient, ResolvePreview};
use super::error::UploadError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PREVIEW_PATH: &str = "/api/get-preview";
const FALLBACK_MESSAGE: &str = "Failed to get preview URL";

#[derive(Serialize)]
struct PreviewRequest<'a> {
    signed_url: &'a str,
    sign: &'a str,
}

#[derive(Deserialize)]
struct PreviewResponse {
    url: String,
}

#[async_trait]
impl ResolvePreview for HttpUploadClient {
    async fn resolve_preview(&self, destination: &str, sign: &str) -> Result<String, UploadError> {
        let url = self.endpoint(PREVIEW_PATH);
        debug!(%url, "resolving preview URL");

        let response = self
            .http
            .post(&url)
            .json(&PreviewRequest {
                signed_url: destination,
                sign,
            })
            .send()
            .await
            .map_err(|e| UploadError::Preview(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            return Err(UploadError::Preview(
                backend_error_message(response, FALLBACK_MESSAGE).await,
            ));
        }

        response
            .json::<PreviewResponse>()
            .await
            .map(|body| body.url)
            .map_err(|e| UploadError::Preview(format!("Failed to parse preview response: {}", e)))
    }
}
