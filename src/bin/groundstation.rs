use anyhow::{anyhow, Context, Result};
use eframe::egui;
use pourdeck::backend::HttpBackend;
use pourdeck::ground_control::GroundStationApp;
use pourdeck::service;
use pourdeck::settings;
use std::sync::{mpsc, Arc};

fn main() -> Result<()> {
    env_logger::init();

    let settings = settings::load_settings();
    let link = HttpBackend::new(settings.backend_url.clone(), settings.request_timeout())
        .context("Failed to set up the serial relay client")?;

    let (tx_event, rx_event) = mpsc::channel();
    let tx_req = service::start_drone_service(Arc::new(link), tx_event);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Ground Station",
        options,
        Box::new(move |_cc| Box::new(GroundStationApp::new(settings, tx_req, rx_event))),
    )
    .map_err(|e| anyhow!("UI error: {}", e))
}
