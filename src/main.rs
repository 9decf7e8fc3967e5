mod app;
mod config;
mod logging;
mod upload;
mod utils;

use app::PixFlyUploader;
use config::UploaderConfig;
use eframe::CreationContext;
use tracing::warn;

fn main() -> Result<(), eframe::Error> {
    logging::init_logging("info");

    // Every field is editable in the settings panel.
    let config = UploaderConfig::load().unwrap_or_else(|e| {
        warn!("falling back to default settings: {}", e);
        UploaderConfig::default()
    });
    if let Err(e) = config.validate() {
        warn!("settings incomplete, fill them in before uploading: {}", e);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([720.0, 640.0])
            .with_min_inner_size([480.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "PixFly Image Uploader",
        options,
        Box::new(move |cc: &CreationContext| Box::new(PixFlyUploader::new(cc, config))),
    )
}
