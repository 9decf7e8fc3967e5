mod authorize;
mod client;
mod controller;
mod error;
mod preview;
mod selection;
mod session;
mod transfer;
mod types;

pub use client::HttpUploadClient;
pub use controller::{BatchUploadController, Credentials, UploadCallbacks};
pub use error::UploadError;
pub use selection::{Candidate, SelectionValidator, DEFAULT_MAX_IMAGES, MAX_FILE_SIZE};
pub use session::{lock, shared, SharedSession, UploadSession};
pub use types::{BatchSummary, EntryId, FileEntry, PreviewRef, UploadStatus};
