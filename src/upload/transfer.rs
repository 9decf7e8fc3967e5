use super::client::{HttpUploadClient, ProgressCallback, Transfer};
use super::error::UploadError;
use super::types::FileSource;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Body;
use tokio_util::io::ReaderStream;
use tracing::debug;

const CHUNK_SIZE: usize = 64 * 1024;

fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((sent as f64 * 100.0 / total as f64).round() as u64).min(100) as u8
}

#[async_trait]
impl Transfer for HttpUploadClient {
    async fn transfer(
        &self,
        destination: &str,
        source: &FileSource,
        media_type: &str,
        on_progress: ProgressCallback,
    ) -> Result<(), UploadError> {
        let read_error = |e: std::io::Error| UploadError::Transfer(format!("Failed to read file: {}", e));
        let file = tokio::fs::File::open(source.path()).await.map_err(read_error)?;
        let total_bytes = file.metadata().await.map_err(read_error)?.len();

        // Progress is reported as each chunk is handed to the connection.
        let mut sent = 0u64;
        let body = ReaderStream::with_capacity(file, CHUNK_SIZE).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                on_progress(percent_of(sent, total_bytes));
            }
            chunk
        });

        debug!(
            file = %source.file_name(),
            total_bytes,
            "uploading file to signed URL"
        );

        let response = self
            .http
            .put(destination)
            .header(CONTENT_TYPE, media_type)
            .header(CONTENT_LENGTH, total_bytes)
            .body(Body::wrap_stream(body))
            .send()
            .await
            .map_err(|e| UploadError::Transfer(format!("Failed to send upload request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Transfer(format!(
                "Upload failed with status: {}",
                status
            )));
        }

        Ok(())
    }
}
