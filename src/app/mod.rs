mod state;
mod ui;

use crate::config::UploaderConfig;
use crate::upload::{
    lock, shared, BatchUploadController, Candidate, EntryId, HttpUploadClient, SelectionValidator,
    SharedSession, UploadCallbacks, UploadError, UploadSession,
};
use eframe::{egui, App};
pub use state::{UploadLog, UploadNotice};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, warn};

const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub struct PixFlyUploader {
    config: UploaderConfig,
    session: SharedSession,
    modal_open: bool,
    log: UploadLog,
    settings_error: Option<String>,
    notice_sender: Sender<UploadNotice>,
    notice_receiver: Receiver<UploadNotice>,
    upload_worker: Option<JoinHandle<()>>,
}

impl PixFlyUploader {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: UploaderConfig) -> Self {
        info!(?config, "initializing PixFly uploader");
        Self::with_config(config)
    }

    fn with_config(config: UploaderConfig) -> Self {
        let (notice_sender, notice_receiver) = mpsc::channel();
        let validator = SelectionValidator::new(config.max_images);
        Self {
            config,
            session: shared(UploadSession::new(validator)),
            modal_open: false,
            log: UploadLog::default(),
            settings_error: None,
            notice_sender,
            notice_receiver,
            upload_worker: None,
        }
    }

    pub fn open_modal(&mut self) {
        let mut session = lock(&self.session);
        session.clear();
        session.set_validator(SelectionValidator::new(self.config.max_images));
        self.modal_open = true;
    }

    /// Closing drops every entry. Uploads still in flight finish on their own
    /// and their results are discarded.
    pub fn close_modal(&mut self) {
        self.modal_open = false;
        lock(&self.session).clear();
    }

    pub fn add_paths(&mut self, paths: Vec<PathBuf>) {
        let candidates: Vec<Candidate> = paths
            .iter()
            .filter_map(|path| match Candidate::from_path(path) {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    warn!(path = %path.display(), "skipping unreadable selection: {}", e);
                    None
                }
            })
            .collect();

        let admitted = lock(&self.session).select(candidates);
        info!(offered = paths.len(), admitted = admitted.len(), "files selected");
    }

    pub fn remove_entry(&mut self, id: EntryId) {
        if !lock(&self.session).remove(id) {
            warn!(entry = %id, "entry is not pending, not removed");
        }
    }

    pub fn start_upload(&mut self, ctx: &egui::Context) {
        if let Err(e) = self.config.validate() {
            warn!("refusing to upload with invalid settings: {}", e);
            self.settings_error = Some(e.to_string());
            return;
        }
        self.settings_error = None;
        self.log.begin_run();

        let client = match HttpUploadClient::new(&self.config.api_base_url) {
            Ok(client) => client,
            Err(e) => {
                self.settings_error = Some(e.to_string());
                return;
            }
        };
        let controller = BatchUploadController::with_http_client(self.config.credentials(), client);
        let callbacks = self.callbacks(ctx);
        let session = self.session.clone();
        let notices = self.notice_sender.clone();
        let repaint = ctx.clone();

        let worker = std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("failed to start upload runtime: {}", e);
                    return;
                }
            };
            rt.block_on(async {
                match controller.run_batch(&session, &callbacks).await {
                    Ok(summary) => {
                        let _ = notices.send(UploadNotice::Finished(summary));
                    }
                    Err(UploadError::BatchInProgress) => {
                        warn!("upload already running, ignoring second start");
                    }
                    Err(e) => warn!("upload not started: {}", e),
                }
            });
            repaint.request_repaint();
        });
        self.upload_worker = Some(worker);
    }

    fn callbacks(&self, ctx: &egui::Context) -> UploadCallbacks {
        let (on_success, success_ctx) = (self.notice_sender.clone(), ctx.clone());
        let (on_error, error_ctx) = (self.notice_sender.clone(), ctx.clone());
        UploadCallbacks::new()
            .on_upload_success(move |urls| {
                let _ = on_success.send(UploadNotice::Uploaded(urls));
                success_ctx.request_repaint();
            })
            .on_upload_error(move |message| {
                let _ = on_error.send(UploadNotice::Failed(message));
                error_ctx.request_repaint();
            })
    }

    /// True until the worker thread of the last run has exited. Covers the
    /// gaps before `begin_batch` and after `finish_batch` where the session
    /// flag alone reads idle.
    fn worker_running(&mut self) -> bool {
        match self.upload_worker.take() {
            Some(worker) if !worker.is_finished() => {
                self.upload_worker = Some(worker);
                true
            }
            Some(worker) => {
                if worker.join().is_err() {
                    error!("upload worker panicked");
                }
                false
            }
            None => false,
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        let mut had_updates = false;
        while let Ok(notice) = self.notice_receiver.try_recv() {
            had_updates = true;
            self.log.apply(notice);
        }

        if had_updates || self.worker_running() || lock(&self.session).is_uploading() {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }
    }
}

impl App for PixFlyUploader {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
