use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Error(String),
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error(_))
    }
}

/// Identity of a [`FileEntry`]. Never reused, not even after a session reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to the bytes of a selected file. Bytes are read only at transfer time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// What the shell shows for an entry: the local file until the backend hands
/// back a public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewRef {
    Local(PathBuf),
    Remote(String),
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    pub id: EntryId,
    pub source: FileSource,
    pub media_type: String,
    pub preview: PreviewRef,
    pub progress: u8,
    pub status: UploadStatus,
    pub size_bytes: u64,
}

impl FileEntry {
    pub fn name(&self) -> String {
        self.source.file_name()
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            UploadStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Single-use write destination for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    pub destination: String,
    pub file_type: String,
}

/// Counts reported at the end of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
}
