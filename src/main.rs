use anyhow::{anyhow, Context, Result};
use eframe::egui;
use pourdeck::app::PourdeckApp;
use pourdeck::backend::HttpBackend;
use pourdeck::service;
use pourdeck::settings;
use std::sync::{mpsc, Arc};

fn main() -> Result<()> {
    env_logger::init();

    let settings = settings::load_settings();
    let backend = HttpBackend::new(settings.backend_url.clone(), settings.request_timeout())
        .context("Failed to set up the backend client")?;

    let (tx_event, rx_event) = mpsc::channel();
    let tx_req = service::start_backend_service(Arc::new(backend), settings.readiness(), tx_event);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Pourdeck",
        options,
        Box::new(move |_cc| Box::new(PourdeckApp::new(settings, tx_req, rx_event))),
    )
    .map_err(|e| anyhow!("UI error: {}", e))
}
