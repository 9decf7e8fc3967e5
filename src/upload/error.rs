use std::fmt;

pub const EMPTY_SELECTION_MESSAGE: &str = "Please select images to upload";

/// The pipeline step an [`UploadError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    Validation,
    Authorize,
    Transfer,
    Preview,
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStep::Validation => "validation",
            UploadStep::Authorize => "authorize",
            UploadStep::Transfer => "transfer",
            UploadStep::Preview => "preview",
        };
        f.write_str(name)
    }
}

/// Errors of the upload pipeline.
///
/// The step variants display only their message, so the text handed to
/// `on_upload_error` is exactly what the backend (or the fallback) said.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    Transfer(String),
    #[error("{0}")]
    Preview(String),
    #[error("{}", EMPTY_SELECTION_MESSAGE)]
    EmptySelection,
    #[error("An upload is already in progress")]
    BatchInProgress,
}

impl UploadError {
    pub fn step(&self) -> Option<UploadStep> {
        match self {
            UploadError::Validation(_) => Some(UploadStep::Validation),
            UploadError::Authorization(_) => Some(UploadStep::Authorize),
            UploadError::Transfer(_) => Some(UploadStep::Transfer),
            UploadError::Preview(_) => Some(UploadStep::Preview),
            UploadError::EmptySelection | UploadError::BatchInProgress => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_errors_display_their_message_verbatim() {
        let err = UploadError::Authorization("quota exceeded".to_string());
        assert_eq!(err.to_string(), "quota exceeded");
        assert_eq!(err.step(), Some(UploadStep::Authorize));
    }

    #[test]
    fn boundary_rejections_have_no_step() {
        assert_eq!(
            UploadError::EmptySelection.to_string(),
            "Please select images to upload"
        );
        assert_eq!(UploadError::BatchInProgress.step(), None);
    }
}
