use super::types::FileSource;
use std::io;
use std::path::Path;
use tracing::warn;

pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
pub const DEFAULT_MAX_IMAGES: usize = 5;

pub const NOT_AN_IMAGE_MESSAGE: &str = "Only image files are allowed";
pub const FILE_TOO_LARGE_MESSAGE: &str = "File size exceeds 5MB limit";

/// A file offered by the user, before admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: FileSource,
    pub media_type: String,
    pub size_bytes: u64,
}

impl Candidate {
    pub fn new(source: FileSource, media_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            source,
            media_type: media_type.into(),
            size_bytes,
        }
    }

    /// Reads the size from disk and guesses the media type from the extension.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        Ok(Self::new(FileSource::new(path), media_type, metadata.len()))
    }
}

/// Result of validating one selection gesture.
#[derive(Debug, Default)]
pub struct Selection {
    pub admitted: Vec<Candidate>,
    /// Last type/size violation seen. Truncation never sets it.
    pub message: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionValidator {
    max_images: usize,
    max_file_size: u64,
}

impl Default for SelectionValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGES)
    }
}

impl SelectionValidator {
    pub fn new(max_images: usize) -> Self {
        Self {
            max_images,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    pub fn max_images(&self) -> usize {
        self.max_images
    }

    pub fn validate(&self, candidates: Vec<Candidate>, current_len: usize) -> Selection {
        let room = self.max_images.saturating_sub(current_len);
        let mut selection = Selection::default();

        for candidate in candidates {
            if !candidate.media_type.starts_with("image/") {
                warn!(
                    file = %candidate.source.file_name(),
                    media_type = %candidate.media_type,
                    "rejected non-image file"
                );
                selection.message = Some(NOT_AN_IMAGE_MESSAGE);
                continue;
            }
            if candidate.size_bytes > self.max_file_size {
                warn!(
                    file = %candidate.source.file_name(),
                    size = candidate.size_bytes,
                    "rejected oversized file"
                );
                selection.message = Some(FILE_TOO_LARGE_MESSAGE);
                continue;
            }
            selection.admitted.push(candidate);
        }

        selection.admitted.truncate(room);
        selection
    }
}
