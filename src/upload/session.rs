use super::error::{UploadError, EMPTY_SELECTION_MESSAGE};
use super::selection::{Candidate, SelectionValidator};
use super::types::{EntryId, FileEntry, FileSource, PreviewRef, UploadStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

pub type SharedSession = Arc<Mutex<UploadSession>>;

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

pub fn shared(session: UploadSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}

/// Locks the session, recovering it if a previous holder panicked.
pub fn lock(session: &SharedSession) -> MutexGuard<'_, UploadSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handed out by [`UploadSession::begin_batch`]: the run's generation and
/// the entries that were pending when it started, in order.
#[derive(Debug, Clone)]
pub struct BatchTicket {
    pub generation: u64,
    pub pending: Vec<EntryId>,
}

/// Everything a dispatch needs from an entry, copied out so the lock is not
/// held across network calls.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub id: EntryId,
    pub source: FileSource,
    pub media_type: String,
}

#[derive(Debug, Default)]
pub struct UploadSession {
    entries: Vec<FileEntry>,
    uploading: bool,
    last_error: Option<String>,
    generation: u64,
    validator: SelectionValidator,
}

impl UploadSession {
    pub fn new(validator: SelectionValidator) -> Self {
        Self {
            validator,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&FileEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn validator(&self) -> &SelectionValidator {
        &self.validator
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.validator.max_images()
    }

    /// Validates and admits a selection. A clean selection clears the
    /// previous message; a rejected candidate replaces it.
    pub fn select(&mut self, candidates: Vec<Candidate>) -> Vec<EntryId> {
        let selection = self.validator.validate(candidates, self.entries.len());
        self.last_error = selection.message.map(str::to_string);

        let mut admitted = Vec::with_capacity(selection.admitted.len());
        for candidate in selection.admitted {
            let id = EntryId(NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed));
            self.entries.push(FileEntry {
                id,
                preview: PreviewRef::Local(candidate.source.path().to_path_buf()),
                source: candidate.source,
                media_type: candidate.media_type,
                progress: 0,
                status: UploadStatus::Pending,
                size_bytes: candidate.size_bytes,
            });
            admitted.push(id);
        }
        admitted
    }

    /// Removes a pending entry. Entries that started or finished stay.
    pub fn remove(&mut self, id: EntryId) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) if self.entries[index].status == UploadStatus::Pending => {
                self.entries.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Drops every entry and starts a new generation. In-flight results for
    /// the old generation are discarded when they arrive.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.uploading = false;
        self.last_error = None;
        self.generation += 1;
    }

    pub fn set_validator(&mut self, validator: SelectionValidator) {
        self.validator = validator;
    }

    pub fn begin_batch(&mut self) -> Result<BatchTicket, UploadError> {
        if self.uploading {
            return Err(UploadError::BatchInProgress);
        }
        if self.entries.is_empty() {
            self.last_error = Some(EMPTY_SELECTION_MESSAGE.to_string());
            return Err(UploadError::EmptySelection);
        }

        self.uploading = true;
        self.last_error = None;
        Ok(BatchTicket {
            generation: self.generation,
            pending: self
                .entries
                .iter()
                .filter(|entry| entry.status == UploadStatus::Pending)
                .map(|entry| entry.id)
                .collect(),
        })
    }

    /// Returns the job for `id` if it still belongs to this generation and is
    /// still pending.
    pub fn claim(&self, generation: u64, id: EntryId) -> Option<DispatchJob> {
        if generation != self.generation {
            return None;
        }
        self.entry(id)
            .filter(|entry| entry.status == UploadStatus::Pending)
            .map(|entry| DispatchJob {
                id: entry.id,
                source: entry.source.clone(),
                media_type: entry.media_type.clone(),
            })
    }

    pub fn record_progress(&mut self, id: EntryId, percent: u8) {
        let Some(entry) = self.entry_mut(id) else {
            debug!(entry = %id, "progress for a removed entry dropped");
            return;
        };
        if entry.status.is_terminal() {
            return;
        }
        entry.status = UploadStatus::Uploading;
        entry.progress = entry.progress.max(percent.min(100));
    }

    /// Marks an entry as uploaded. Returns `false` if the entry is gone.
    pub fn complete(&mut self, id: EntryId, url: &str) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.status = UploadStatus::Success;
                entry.preview = PreviewRef::Remote(url.to_string());
                true
            }
            None => false,
        }
    }

    /// Marks an entry as failed. Returns `false` if the entry is gone.
    pub fn fail(&mut self, id: EntryId, message: &str) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.status = UploadStatus::Error(message.to_string());
                true
            }
            None => false,
        }
    }

    pub fn finish_batch(&mut self, generation: u64) {
        if generation == self.generation {
            self.uploading = false;
        }
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut FileEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }
}
