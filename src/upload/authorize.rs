use super::client::{backend_error_message, Authorize, HttpUploadClient};
use super::error::UploadError;
use super::types::AuthorizationGrant;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SIGNED_URI_PATH: &str = "/api/signed-uri";
const FALLBACK_MESSAGE: &str = "Failed to generate pre-signed URL";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedUriRequest<'a> {
    file_type: &'a str,
    proj: &'a str,
    sign: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUriResponse {
    signed_url: String,
}

#[async_trait]
impl Authorize for HttpUploadClient {
    async fn authorize(
        &self,
        file_type: &str,
        proj: &str,
        sign: &str,
    ) -> Result<AuthorizationGrant, UploadError> {
        let url = self.endpoint(SIGNED_URI_PATH);
        debug!(%url, file_type, "requesting signed upload URL");

        let response = self
            .http
            .post(&url)
            .json(&SignedUriRequest {
                file_type,
                proj,
                sign,
            })
            .send()
            .await
            .map_err(|e| UploadError::Authorization(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            return Err(UploadError::Authorization(
                backend_error_message(response, FALLBACK_MESSAGE).await,
            ));
        }

        let body = response.json::<SignedUriResponse>().await.map_err(|e| {
            UploadError::Authorization(format!("Failed to parse signed URL response: {}", e))
        })?;

        Ok(AuthorizationGrant {
            destination: body.signed_url,
            file_type: file_type.to_string(),
        })
    }
}
