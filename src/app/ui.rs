use super::PixFlyUploader;
use crate::upload::{lock, EntryId, FileEntry, PreviewRef, UploadStatus, MAX_FILE_SIZE};
use crate::utils::{ColorExt, FileSizeUtils};
use eframe::egui::{self, Align2, Color32, RichText};
use rfd::FileDialog;
use std::path::PathBuf;

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];
const CARD_WIDTH: f32 = 170.0;
const ERROR_COLOR: Color32 = Color32::from_rgb(220, 50, 50);
const SUCCESS_COLOR: Color32 = Color32::from_rgb(0, 180, 0);

/// Gestures collected while drawing the modal, applied once the frame is done.
#[derive(Default)]
struct ModalActions {
    picked: Vec<PathBuf>,
    remove: Option<EntryId>,
    start_upload: bool,
}

impl PixFlyUploader {
    pub fn render(&mut self, ctx: &egui::Context) {
        let accent = Color32::parse_hex(&self.config.accent_color)
            .unwrap_or(Color32::from_rgb(161, 89, 225));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("PixFly Image Uploader");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new("Upload images and get shareable preview links")
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });

                ui.add_space(20.0);
                self.render_settings(ui);
                ui.add_space(20.0);

                ui.vertical_centered(|ui| {
                    let button = egui::Button::new(
                        RichText::new(&self.config.button_text).color(Color32::WHITE),
                    )
                    .fill(accent)
                    .min_size(egui::vec2(200.0, 40.0));
                    if ui.add(button).clicked() {
                        self.open_modal();
                    }
                });

                ui.add_space(20.0);
                self.render_results(ui);
            });
        });

        if self.modal_open {
            self.render_modal(ctx, accent);
        }
    }

    fn render_settings(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label("Backend settings");
            ui.add_space(8.0);
            egui::Grid::new("settings")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label("API base URL");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.config.api_base_url)
                            .hint_text("https://api.example.com")
                            .desired_width(f32::INFINITY),
                    );
                    ui.end_row();

                    ui.label("Project");
                    ui.text_edit_singleline(&mut self.config.proj);
                    ui.end_row();

                    ui.label("Sign token");
                    ui.add(egui::TextEdit::singleline(&mut self.config.sign).password(true));
                    ui.end_row();

                    ui.label("Max images");
                    ui.add(egui::DragValue::new(&mut self.config.max_images).clamp_range(1..=50));
                    ui.end_row();
                });

            if let Some(error) = &self.settings_error {
                ui.add_space(5.0);
                ui.colored_label(ERROR_COLOR, error);
            }
        });
    }

    fn render_results(&mut self, ui: &mut egui::Ui) {
        if self.log.uploaded_urls.is_empty() && self.log.failures.is_empty() {
            return;
        }

        ui.group(|ui| {
            let status = self.log.get_status_text();
            if !status.is_empty() {
                ui.label(status);
            }

            if ui
                .button(if self.log.show_details {
                    "Hide Details"
                } else {
                    "Show Details"
                })
                .clicked()
            {
                self.log.show_details = !self.log.show_details;
            }

            if self.log.show_details {
                egui::ScrollArea::vertical()
                    .id_source("results")
                    .max_height(200.0)
                    .show(ui, |ui| {
                        for url in &self.log.uploaded_urls {
                            ui.horizontal(|ui| {
                                ui.label("✅");
                                ui.hyperlink(url);
                                if ui.small_button("📋").on_hover_text("Copy URL").clicked() {
                                    ui.output_mut(|o| o.copied_text = url.clone());
                                }
                            });
                        }
                        for failure in &self.log.failures {
                            ui.horizontal(|ui| {
                                ui.label("❌");
                                ui.colored_label(ERROR_COLOR, failure);
                            });
                        }
                    });
            }

            if ui.button("🗑 Clear").clicked() {
                self.log.clear();
            }
        });
    }

    fn render_modal(&mut self, ctx: &egui::Context, accent: Color32) {
        let mut open = true;
        let mut actions = ModalActions::default();

        // Drag and drop from the OS lands wherever the window is.
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());

        let (entries, uploading, last_error, full, max_images) = {
            let session = lock(&self.session);
            (
                session.entries().to_vec(),
                session.is_uploading(),
                session.last_error().map(str::to_string),
                session.is_full(),
                session.validator().max_images(),
            )
        };

        let screen = ctx.screen_rect();
        egui::Window::new("Upload Your Images")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .default_size([screen.width() * 0.8, screen.height() * 0.8])
            .show(ctx, |ui| {
                Self::render_drop_zone(ui, &mut actions, hovering, full, max_images, !entries.is_empty());

                ui.add_space(12.0);
                if !entries.is_empty() {
                    egui::ScrollArea::vertical()
                        .id_source("entries")
                        .max_height((ui.available_height() - 80.0).max(120.0))
                        .show(ui, |ui| {
                            ui.horizontal_wrapped(|ui| {
                                for (index, entry) in entries.iter().enumerate() {
                                    Self::render_entry(ui, index, entry, accent, &mut actions);
                                }
                            });
                        });
                }

                if let Some(error) = &last_error {
                    ui.add_space(8.0);
                    ui.colored_label(ERROR_COLOR, error);
                }

                ui.separator();
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if uploading { "Uploading..." } else { "Start Upload" };
                    ui.add_enabled_ui(!entries.is_empty() && !uploading, |ui| {
                        let button = egui::Button::new(RichText::new(label).strong().color(Color32::WHITE))
                            .fill(accent)
                            .min_size(egui::vec2(160.0, 36.0));
                        if ui.add(button).clicked() {
                            actions.start_upload = true;
                        }
                    });
                });
            });

        actions.picked.extend(dropped);
        if !actions.picked.is_empty() && !full {
            self.add_paths(actions.picked);
        }
        if let Some(id) = actions.remove {
            self.remove_entry(id);
        }
        if actions.start_upload {
            self.start_upload(ctx);
        }
        if !open {
            self.close_modal();
        }
    }

    fn render_drop_zone(
        ui: &mut egui::Ui,
        actions: &mut ModalActions,
        hovering: bool,
        full: bool,
        max_images: usize,
        has_entries: bool,
    ) {
        let stroke_color = if hovering || has_entries {
            SUCCESS_COLOR
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke.color
        };

        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(2.0, stroke_color))
            .inner_margin(24.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("🖼").size(32.0));
                    ui.add_enabled_ui(!full, |ui| {
                        if ui.link("Click to upload").clicked() {
                            if let Some(paths) = FileDialog::new()
                                .add_filter("Images", &IMAGE_EXTENSIONS)
                                .pick_files()
                            {
                                actions.picked = paths;
                            }
                        }
                    });
                    ui.label("or drag and drop");
                    ui.label(
                        RichText::new(format!(
                            "PNG, JPG, JPEG up to {} (Max {} images)",
                            FileSizeUtils::format_size(MAX_FILE_SIZE),
                            max_images
                        ))
                        .small()
                        .weak(),
                    );
                });
            });
    }

    fn render_entry(
        ui: &mut egui::Ui,
        index: usize,
        entry: &FileEntry,
        accent: Color32,
        actions: &mut ModalActions,
    ) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(CARD_WIDTH);
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("{}.", index + 1)).weak());
                    ui.add(egui::Label::new(RichText::new(entry.name()).strong()).truncate(true));
                });
                ui.label(RichText::new(FileSizeUtils::format_kilobytes(entry.size_bytes)).small());

                match &entry.status {
                    UploadStatus::Pending => {
                        ui.horizontal(|ui| {
                            ui.label("⏳");
                            if ui.small_button("❌").on_hover_text("Remove").clicked() {
                                actions.remove = Some(entry.id);
                            }
                        });
                    }
                    UploadStatus::Uploading => {
                        let progress = egui::ProgressBar::new(entry.progress as f32 / 100.0)
                            .show_percentage()
                            .animate(false)
                            .fill(accent);
                        ui.add(progress);
                    }
                    UploadStatus::Success => {
                        ui.colored_label(SUCCESS_COLOR, "✅ Uploaded");
                    }
                    UploadStatus::Error(_) => {
                        ui.colored_label(ERROR_COLOR, "❌ Failed");
                        if let Some(message) = entry.error_message() {
                            ui.add(
                                egui::Label::new(RichText::new(message).small().color(ERROR_COLOR))
                                    .wrap(true),
                            );
                        }
                    }
                }

                if ui.small_button("🔍 Preview").clicked() {
                    let target = match &entry.preview {
                        PreviewRef::Local(path) => path.display().to_string(),
                        PreviewRef::Remote(url) => url.clone(),
                    };
                    if let Err(e) = open::that(&target) {
                        tracing::warn!(%target, "failed to open preview: {}", e);
                    }
                }
            });
        });
    }
}
