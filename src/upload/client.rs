use super::error::UploadError;
use super::types::{AuthorizationGrant, FileSource};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use std::sync::Arc;

/// Receives transfer progress as a whole percentage.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

#[async_trait]
pub trait Authorize: Send + Sync {
    async fn authorize(
        &self,
        file_type: &str,
        proj: &str,
        sign: &str,
    ) -> Result<AuthorizationGrant, UploadError>;
}

#[async_trait]
pub trait Transfer: Send + Sync {
    async fn transfer(
        &self,
        destination: &str,
        source: &FileSource,
        media_type: &str,
        on_progress: ProgressCallback,
    ) -> Result<(), UploadError>;
}

#[async_trait]
pub trait ResolvePreview: Send + Sync {
    async fn resolve_preview(&self, destination: &str, sign: &str) -> Result<String, UploadError>;
}

/// reqwest-backed implementation of all three upload steps.
#[derive(Clone)]
pub struct HttpUploadClient {
    pub(super) http: Client,
    base_url: String,
}

impl HttpUploadClient {
    pub fn new(api_base_url: &str) -> Result<Self, UploadError> {
        Self::with_client(Client::new(), api_base_url)
    }

    pub fn with_client(http: Client, api_base_url: &str) -> Result<Self, UploadError> {
        let parsed = Url::parse(api_base_url).map_err(|e| {
            UploadError::Validation(format!("Invalid API base URL '{}': {}", api_base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(UploadError::Validation(format!(
                "API base URL must use http or https: {}",
                api_base_url
            )));
        }

        Ok(Self {
            http,
            base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(super) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Pulls `error` out of a failed backend response, or falls back.
pub(super) async fn backend_error_message(response: Response, fallback: &str) -> String {
    match response.json::<ErrorBody>().await {
        Ok(ErrorBody { error: Some(message) }) if !message.is_empty() => message,
        _ => fallback.to_string(),
    }
}
