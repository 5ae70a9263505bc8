use eframe::egui;

use holo_avatar::config::{self, AvatarConfig};

mod app;

use app::AvatarApp;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}; using defaults");
            AvatarConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "AI Digital Officer",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(AvatarApp::new(config)))
        }),
    )
}
