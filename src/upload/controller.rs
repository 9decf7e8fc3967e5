use super::client::{Authorize, HttpUploadClient, ProgressCallback, ResolvePreview, Transfer};
use super::error::UploadError;
use super::session::{lock, DispatchJob, SharedSession};
use super::types::{BatchSummary, EntryId};
use std::sync::Arc;
use tracing::{debug, error, info};

type SuccessCallback = Box<dyn Fn(Vec<String>) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(String) + Send + Sync>;

/// Project id and signing token forwarded to the backend as-is.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub proj: String,
    pub sign: String,
}

/// Per-file outcome hooks. Each successful file yields a one-element list.
#[derive(Default)]
pub struct UploadCallbacks {
    on_upload_success: Option<SuccessCallback>,
    on_upload_error: Option<ErrorCallback>,
}

impl UploadCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_upload_success(mut self, callback: impl Fn(Vec<String>) + Send + Sync + 'static) -> Self {
        self.on_upload_success = Some(Box::new(callback));
        self
    }

    pub fn on_upload_error(mut self, callback: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_upload_error = Some(Box::new(callback));
        self
    }

    fn notify_success(&self, url: String) {
        if let Some(callback) = &self.on_upload_success {
            callback(vec![url]);
        }
    }

    fn notify_error(&self, message: String) {
        if let Some(callback) = &self.on_upload_error {
            callback(message);
        }
    }
}

/// Uploads the pending entries of a session one after another.
pub struct BatchUploadController {
    credentials: Credentials,
    authorizer: Arc<dyn Authorize>,
    transfer: Arc<dyn Transfer>,
    previews: Arc<dyn ResolvePreview>,
}

impl BatchUploadController {
    pub fn new(
        credentials: Credentials,
        authorizer: Arc<dyn Authorize>,
        transfer: Arc<dyn Transfer>,
        previews: Arc<dyn ResolvePreview>,
    ) -> Self {
        Self {
            credentials,
            authorizer,
            transfer,
            previews,
        }
    }

    pub fn with_http_client(credentials: Credentials, client: HttpUploadClient) -> Self {
        let client = Arc::new(client);
        Self::new(credentials, client.clone(), client.clone(), client)
    }

    /// Runs every entry that is pending at its turn. Per-file failures are
    /// recorded on the entry and reported through `callbacks`; only the
    /// empty-session and already-running rejections are returned as errors.
    pub async fn run_batch(
        &self,
        session: &SharedSession,
        callbacks: &UploadCallbacks,
    ) -> Result<BatchSummary, UploadError> {
        let ticket = lock(session).begin_batch()?;
        info!(
            generation = ticket.generation,
            pending = ticket.pending.len(),
            "starting upload batch"
        );

        let mut summary = BatchSummary::default();
        for id in ticket.pending {
            let job = lock(session).claim(ticket.generation, id);
            let Some(job) = job else {
                debug!(entry = %id, "entry no longer pending, skipping");
                continue;
            };
            summary.dispatched += 1;

            match self.dispatch(session, &job).await {
                Ok(url) => {
                    let recorded = lock(session).complete(id, &url);
                    if recorded {
                        info!(entry = %id, %url, "upload complete");
                        summary.succeeded += 1;
                        callbacks.notify_success(url);
                    } else {
                        debug!(entry = %id, "upload finished after session reset, dropped");
                    }
                }
                Err(err) => {
                    let step = err.step().map(|step| step.to_string()).unwrap_or_default();
                    error!(entry = %id, file = %job.source.file_name(), %step, "Error uploading file: {}", err);

                    let message = err.to_string();
                    let recorded = lock(session).fail(id, &message);
                    if recorded {
                        summary.failed += 1;
                        callbacks.notify_error(message);
                    } else {
                        debug!(entry = %id, "failure after session reset, dropped");
                    }
                }
            }
        }

        lock(session).finish_batch(ticket.generation);
        info!(
            dispatched = summary.dispatched,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "upload batch finished"
        );
        Ok(summary)
    }

    async fn dispatch(&self, session: &SharedSession, job: &DispatchJob) -> Result<String, UploadError> {
        let grant = self
            .authorizer
            .authorize(&job.media_type, &self.credentials.proj, &self.credentials.sign)
            .await?;

        self.transfer
            .transfer(
                &grant.destination,
                &job.source,
                &grant.file_type,
                progress_reporter(session, job.id),
            )
            .await?;

        self.previews
            .resolve_preview(&grant.destination, &self.credentials.sign)
            .await
    }
}

fn progress_reporter(session: &SharedSession, id: EntryId) -> ProgressCallback {
    let session = Arc::clone(session);
    Arc::new(move |percent| lock(&session).record_progress(id, percent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::selection::{Candidate, SelectionValidator};
    use crate::upload::session::{shared, UploadSession};
    use crate::upload::types::{AuthorizationGrant, FileSource, PreviewRef, UploadStatus};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Scripted backend: fails authorization for the listed files and
    /// records every call it sees.
    #[derive(Default)]
    struct FakeBackend {
        deny: HashSet<String>,
        calls: Mutex<Vec<String>>,
        session: Mutex<Option<SharedSession>>,
        uploading_seen: Mutex<Vec<bool>>,
    }

    impl FakeBackend {
        fn denying(names: &[&str]) -> Self {
            Self {
                deny: names.iter().map(|name| name.to_string()).collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Authorize for FakeBackend {
        async fn authorize(
            &self,
            file_type: &str,
            proj: &str,
            sign: &str,
        ) -> Result<AuthorizationGrant, UploadError> {
            assert_eq!((proj, sign), ("proj", "sign"));
            if let Some(session) = self.session.lock().unwrap().as_ref() {
                self.uploading_seen.lock().unwrap().push(lock(session).is_uploading());
            }
            let name = file_type.trim_start_matches("image/").to_string();
            self.calls.lock().unwrap().push(format!("authorize:{name}"));
            if self.deny.contains(&name) {
                return Err(UploadError::Authorization("quota exceeded".to_string()));
            }
            Ok(AuthorizationGrant {
                destination: format!("https://x/{name}"),
                file_type: file_type.to_string(),
            })
        }
    }

    #[async_trait]
    impl Transfer for FakeBackend {
        async fn transfer(
            &self,
            destination: &str,
            _source: &FileSource,
            _media_type: &str,
            on_progress: ProgressCallback,
        ) -> Result<(), UploadError> {
            self.calls.lock().unwrap().push(format!("transfer:{destination}"));
            on_progress(50);
            on_progress(100);
            Ok(())
        }
    }

    #[async_trait]
    impl ResolvePreview for FakeBackend {
        async fn resolve_preview(&self, destination: &str, sign: &str) -> Result<String, UploadError> {
            assert_eq!(sign, "sign");
            self.calls.lock().unwrap().push(format!("preview:{destination}"));
            Ok(destination.replace("https://x/", "https://cdn/") + ".jpg")
        }
    }

    fn controller(backend: &Arc<FakeBackend>) -> BatchUploadController {
        BatchUploadController::new(
            Credentials {
                proj: "proj".to_string(),
                sign: "sign".to_string(),
            },
            backend.clone(),
            backend.clone(),
            backend.clone(),
        )
    }

    /// Media types double as file tags so the fake can tell entries apart.
    fn session_with(tags: &[&str]) -> SharedSession {
        let mut session = UploadSession::new(SelectionValidator::new(10));
        session.select(
            tags.iter()
                .map(|tag| Candidate::new(FileSource::new(format!("{tag}.jpg")), format!("image/{tag}"), 1024))
                .collect(),
        );
        shared(session)
    }

    fn recording_callbacks() -> (UploadCallbacks, Arc<Mutex<Vec<Vec<String>>>>, Arc<Mutex<Vec<String>>>) {
        let successes = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let (s, e) = (successes.clone(), errors.clone());
        let callbacks = UploadCallbacks::new()
            .on_upload_success(move |urls| s.lock().unwrap().push(urls))
            .on_upload_error(move |message| e.lock().unwrap().push(message));
        (callbacks, successes, errors)
    }

    #[tokio::test]
    async fn single_entry_happy_path() {
        let backend = Arc::new(FakeBackend::default());
        let session = session_with(&["o1"]);
        let (callbacks, successes, errors) = recording_callbacks();

        let summary = controller(&backend).run_batch(&session, &callbacks).await.unwrap();

        assert_eq!(summary, BatchSummary { dispatched: 1, succeeded: 1, failed: 0 });
        assert_eq!(*successes.lock().unwrap(), vec![vec!["https://cdn/o1.jpg".to_string()]]);
        assert!(errors.lock().unwrap().is_empty());

        let guard = lock(&session);
        let entry = &guard.entries()[0];
        assert_eq!(entry.status, UploadStatus::Success);
        assert_eq!(entry.preview, PreviewRef::Remote("https://cdn/o1.jpg".to_string()));
        assert!(!guard.is_uploading());
    }

    #[tokio::test]
    async fn authorization_failure_skips_transfer_and_reports_error() {
        let backend = Arc::new(FakeBackend::denying(&["o1"]));
        let session = session_with(&["o1"]);
        let (callbacks, successes, errors) = recording_callbacks();

        controller(&backend).run_batch(&session, &callbacks).await.unwrap();

        assert_eq!(backend.calls(), vec!["authorize:o1"]);
        assert_eq!(*errors.lock().unwrap(), vec!["quota exceeded".to_string()]);
        assert!(successes.lock().unwrap().is_empty());

        let guard = lock(&session);
        assert_eq!(guard.entries()[0].error_message(), Some("quota exceeded"));
        assert!(!guard.is_uploading());
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let backend = Arc::new(FakeBackend::denying(&["b"]));
        let session = session_with(&["a", "b", "c"]);
        let (callbacks, successes, errors) = recording_callbacks();

        let summary = controller(&backend).run_batch(&session, &callbacks).await.unwrap();

        assert_eq!(summary, BatchSummary { dispatched: 3, succeeded: 2, failed: 1 });
        assert_eq!(successes.lock().unwrap().len(), 2);
        assert_eq!(errors.lock().unwrap().len(), 1);

        let statuses: Vec<_> = lock(&session).entries().iter().map(|e| e.status.clone()).collect();
        assert_eq!(
            statuses,
            vec![
                UploadStatus::Success,
                UploadStatus::Error("quota exceeded".to_string()),
                UploadStatus::Success
            ]
        );
    }

    #[tokio::test]
    async fn rerun_only_dispatches_pending_entries() {
        let backend = Arc::new(FakeBackend::denying(&["b"]));
        let session = session_with(&["a", "b"]);
        let (callbacks, _, _) = recording_callbacks();
        let controller = controller(&backend);

        controller.run_batch(&session, &callbacks).await.unwrap();
        lock(&session).select(vec![Candidate::new(FileSource::new("c.jpg"), "image/c", 10)]);
        backend.calls.lock().unwrap().clear();

        let summary = controller.run_batch(&session, &callbacks).await.unwrap();

        assert_eq!(summary.dispatched, 1);
        assert_eq!(
            backend.calls(),
            vec!["authorize:c", "transfer:https://x/c", "preview:https://x/c"]
        );
        let guard = lock(&session);
        assert_eq!(guard.entries()[0].status, UploadStatus::Success);
        assert_eq!(guard.entries()[1].error_message(), Some("quota exceeded"));
    }

    #[tokio::test]
    async fn empty_session_makes_no_calls() {
        let backend = Arc::new(FakeBackend::default());
        let session = shared(UploadSession::default());
        let (callbacks, _, _) = recording_callbacks();

        let err = controller(&backend).run_batch(&session, &callbacks).await.unwrap_err();

        assert_eq!(err, UploadError::EmptySelection);
        assert!(backend.calls().is_empty());
        let guard = lock(&session);
        assert_eq!(guard.last_error(), Some("Please select images to upload"));
        assert!(!guard.is_uploading());
    }

    #[tokio::test]
    async fn session_is_marked_uploading_while_dispatching() {
        let backend = Arc::new(FakeBackend::default());
        let session = session_with(&["a", "b"]);
        *backend.session.lock().unwrap() = Some(session.clone());
        let (callbacks, _, _) = recording_callbacks();

        controller(&backend).run_batch(&session, &callbacks).await.unwrap();

        assert_eq!(*backend.uploading_seen.lock().unwrap(), vec![true, true]);
        assert!(!lock(&session).is_uploading());
    }

    #[tokio::test]
    async fn concurrent_run_is_rejected() {
        let backend = Arc::new(FakeBackend::default());
        let session = session_with(&["a"]);
        lock(&session).begin_batch().unwrap();
        let (callbacks, _, _) = recording_callbacks();

        let err = controller(&backend).run_batch(&session, &callbacks).await.unwrap_err();

        assert_eq!(err, UploadError::BatchInProgress);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn results_after_reset_fire_no_callbacks() {
        /// Clears the session while the first entry is being transferred.
        struct ResettingTransfer(SharedSession);

        #[async_trait]
        impl Transfer for ResettingTransfer {
            async fn transfer(
                &self,
                _destination: &str,
                _source: &FileSource,
                _media_type: &str,
                on_progress: ProgressCallback,
            ) -> Result<(), UploadError> {
                lock(&self.0).clear();
                on_progress(100);
                Ok(())
            }
        }

        let backend = Arc::new(FakeBackend::default());
        let session = session_with(&["a", "b"]);
        let (callbacks, successes, errors) = recording_callbacks();
        let controller = BatchUploadController::new(
            Credentials {
                proj: "proj".to_string(),
                sign: "sign".to_string(),
            },
            backend.clone(),
            Arc::new(ResettingTransfer(session.clone())),
            backend.clone(),
        );

        let summary = controller.run_batch(&session, &callbacks).await.unwrap();

        assert_eq!(summary, BatchSummary { dispatched: 1, succeeded: 0, failed: 0 });
        assert!(successes.lock().unwrap().is_empty());
        assert!(errors.lock().unwrap().is_empty());
        assert_eq!(backend.calls(), vec!["authorize:a", "preview:https://x/a"]);
        assert!(lock(&session).entries().is_empty());
    }

    #[tokio::test]
    async fn transfer_and_preview_failures_are_isolated() {
        /// Fails the transfer of `a` mid-way, the preview of `b`, and lets `c`
        /// through without any progress report.
        struct ScriptedSteps {
            session: SharedSession,
            status_before_failure: Mutex<Option<UploadStatus>>,
        }

        #[async_trait]
        impl Transfer for ScriptedSteps {
            async fn transfer(
                &self,
                destination: &str,
                _source: &FileSource,
                _media_type: &str,
                on_progress: ProgressCallback,
            ) -> Result<(), UploadError> {
                if destination.ends_with("/a") {
                    on_progress(30);
                    let status = lock(&self.session).entries()[0].status.clone();
                    *self.status_before_failure.lock().unwrap() = Some(status);
                    return Err(UploadError::Transfer("boom".to_string()));
                }
                Ok(())
            }
        }

        #[async_trait]
        impl ResolvePreview for ScriptedSteps {
            async fn resolve_preview(&self, destination: &str, _sign: &str) -> Result<String, UploadError> {
                if destination.ends_with("/b") {
                    return Err(UploadError::Preview("nope".to_string()));
                }
                Ok(format!("{destination}.jpg"))
            }
        }

        let session = session_with(&["a", "b", "c"]);
        let steps = Arc::new(ScriptedSteps {
            session: session.clone(),
            status_before_failure: Mutex::new(None),
        });
        let (callbacks, successes, errors) = recording_callbacks();
        let controller = BatchUploadController::new(
            Credentials {
                proj: "proj".to_string(),
                sign: "sign".to_string(),
            },
            Arc::new(FakeBackend::default()),
            steps.clone(),
            steps.clone(),
        );

        let summary = controller.run_batch(&session, &callbacks).await.unwrap();

        assert_eq!(summary, BatchSummary { dispatched: 3, succeeded: 1, failed: 2 });
        assert_eq!(
            *steps.status_before_failure.lock().unwrap(),
            Some(UploadStatus::Uploading)
        );
        assert_eq!(*errors.lock().unwrap(), vec!["boom".to_string(), "nope".to_string()]);
        assert_eq!(*successes.lock().unwrap(), vec![vec!["https://x/c.jpg".to_string()]]);

        let guard = lock(&session);
        let statuses: Vec<_> = guard.entries().iter().map(|e| e.status.clone()).collect();
        assert_eq!(
            statuses,
            vec![
                UploadStatus::Error("boom".to_string()),
                UploadStatus::Error("nope".to_string()),
                UploadStatus::Success
            ]
        );
        assert_eq!(guard.entries()[0].progress, 30);
        assert_eq!(guard.entries()[2].progress, 0);
        assert!(!guard.is_uploading());
    }
}
