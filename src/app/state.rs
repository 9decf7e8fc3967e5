use crate::upload::BatchSummary;

/// Messages from the upload worker thread to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadNotice {
    Uploaded(Vec<String>),
    Failed(String),
    Finished(BatchSummary),
}

/// What the embedding window has been told through the outcome callbacks.
#[derive(Debug, Default)]
pub struct UploadLog {
    pub uploaded_urls: Vec<String>,
    pub failures: Vec<String>,
    pub last_summary: Option<BatchSummary>,
    pub show_details: bool,
}

impl UploadLog {
    pub fn apply(&mut self, notice: UploadNotice) {
        match notice {
            UploadNotice::Uploaded(urls) => self.uploaded_urls.extend(urls),
            UploadNotice::Failed(message) => self.failures.push(message),
            UploadNotice::Finished(summary) => self.last_summary = Some(summary),
        }
    }

    /// Forgets the previous run's status line; URLs and failures are kept.
    pub fn begin_run(&mut self) {
        self.last_summary = None;
    }

    pub fn clear(&mut self) {
        *self = UploadLog::default();
    }

    pub fn get_status_text(&self) -> String {
        match &self.last_summary {
            None => String::new(),
            Some(summary) => format!(
                "Final Status: {}/{} files | ✅ Success: {} | ❌ Failed: {}",
                summary.succeeded + summary.failed,
                summary.dispatched,
                summary.succeeded,
                summary.failed
            ),
        }
    }
}
