use crate::alert::Alerts;
use crate::drone::{DroneAction, DroneCommand, DroneController, DroneError, FlightMode, MAX_ALTITUDE};
use crate::model::SerialPortInfo;
use crate::service::{DroneEvent, DroneRequest};
use crate::settings::AppSettings;
use eframe::egui;
use log::warn;
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

pub struct GroundStationApp {
    settings: AppSettings,
    requests: Sender<DroneRequest>,
    events: Receiver<DroneEvent>,
    drone: DroneController,
    alerts: Alerts,
    ports: Vec<SerialPortInfo>,
    selected_port: String,
    connecting: bool,
    // One command at a time; the next is planned against acknowledged state.
    awaiting: Option<DroneCommand>,
    altitude_input: f32,
}

impl GroundStationApp {
    pub fn new(
        settings: AppSettings,
        requests: Sender<DroneRequest>,
        events: Receiver<DroneEvent>,
    ) -> Self {
        let mut app = Self {
            settings,
            requests,
            events,
            drone: DroneController::default(),
            alerts: Alerts::default(),
            ports: Vec::new(),
            selected_port: String::new(),
            connecting: false,
            awaiting: None,
            altitude_input: 0.0,
        };
        app.send(DroneRequest::ListPorts);
        app
    }

    fn send(&mut self, request: DroneRequest) -> bool {
        if self.requests.send(request).is_err() {
            warn!("[GROUND] Drone service is gone");
            self.alerts.error("Drone service stopped. Please restart the application.");
            return false;
        }
        true
    }

    fn connect(&mut self) {
        if self.selected_port.is_empty() {
            self.alerts.error("No port selected");
            return;
        }
        let request = DroneRequest::Connect {
            port: self.selected_port.clone(),
            baudrate: self.settings.baud_rate,
        };
        self.connecting = self.send(request);
    }

    fn request(&mut self, action: DroneAction) {
        if self.awaiting.is_some() {
            return;
        }
        match self.drone.prepare(action) {
            Ok(command) => {
                if self.send(DroneRequest::Send(command)) {
                    self.awaiting = Some(command);
                }
            }
            Err(e) => self.alerts.error(e.to_string()),
        }
    }

    pub fn apply_event(&mut self, event: DroneEvent) {
        match event {
            DroneEvent::Ports(Ok(ports)) => {
                if self.selected_port.is_empty() || !ports.iter().any(|p| p.port == self.selected_port) {
                    self.selected_port = ports.first().map(|p| p.port.clone()).unwrap_or_default();
                }
                self.ports = ports;
            }
            DroneEvent::Ports(Err(e)) => self.alerts.error(format!("Failed to list ports: {}", e)),
            DroneEvent::Connected { port, result } => {
                self.connecting = false;
                match result {
                    Ok(()) => {
                        self.alerts.success(format!("Connected to {}", port));
                        self.drone.set_connected(port);
                    }
                    Err(e) => self.alerts.error(format!("Failed to connect to {}: {}", port, e)),
                }
            }
            DroneEvent::Sent { command, result } => {
                self.awaiting = None;
                match result {
                    Ok(_) => self.drone.acknowledge(command),
                    Err(e) => self.alerts.error(DroneError::from(e).to_string()),
                }
            }
        }
    }

    fn connection_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Ground Station");
            ui.separator();

            let shown = if self.selected_port.is_empty() { "No ports" } else { self.selected_port.as_str() };
            egui::ComboBox::from_id_source("serial_port").selected_text(shown.to_string()).show_ui(ui, |ui| {
                for port in &self.ports {
                    let label = if port.description.is_empty() {
                        port.port.clone()
                    } else {
                        format!("{} ({})", port.port, port.description)
                    };
                    ui.selectable_value(&mut self.selected_port, port.port.clone(), label);
                }
            });

            if ui.button("Refresh").clicked() {
                self.send(DroneRequest::ListPorts);
            }
            if ui.add_enabled(!self.connecting, egui::Button::new("Connect")).clicked() {
                self.connect();
            }
            if self.connecting {
                ui.spinner();
            }

            ui.separator();
            match self.drone.port() {
                Some(port) => ui.colored_label(egui::Color32::GREEN, format!("Connected: {}", port)),
                None => ui.colored_label(egui::Color32::LIGHT_RED, "Not connected"),
            };
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let state = self.drone.state.clone();

        egui::Grid::new("drone_status").num_columns(2).show(ui, |ui| {
            ui.label("Armed");
            ui.label(if state.armed { "Yes" } else { "No" });
            ui.end_row();
            ui.label("Flying");
            ui.label(if state.flying { "Yes" } else { "No" });
            ui.end_row();
            ui.label("Position hold");
            ui.label(if state.pos_hold { "On" } else { "Off" });
            ui.end_row();
            ui.label("Mode");
            ui.label(state.mode.name());
            ui.end_row();
            ui.label("Operating altitude");
            ui.label(format!("{} m", state.operating_altitude));
            ui.end_row();
        });
        ui.separator();

        let idle = self.awaiting.is_none();
        let mut action = None;
        ui.horizontal(|ui| {
            let arm = if state.armed { "Disarm" } else { "Arm" };
            if ui.add_enabled(idle, egui::Button::new(arm)).clicked() {
                action = Some(DroneAction::ToggleArm);
            }
            if ui.add_enabled(idle, egui::Button::new("Launch")).clicked() {
                action = Some(DroneAction::Launch);
            }
            if ui.add_enabled(idle, egui::Button::new("Land")).clicked() {
                action = Some(DroneAction::Land);
            }
            let hold = if state.pos_hold { "Position Hold Off" } else { "Position Hold On" };
            if ui.add_enabled(idle, egui::Button::new(hold)).clicked() {
                action = Some(DroneAction::TogglePosHold);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Mode:");
            for mode in FlightMode::SELECTABLE {
                let button = egui::SelectableLabel::new(state.mode == mode, mode.name());
                if ui.add_enabled(idle, button).clicked() {
                    action = Some(DroneAction::SetMode(mode));
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Altitude:");
            ui.add(
                egui::DragValue::new(&mut self.altitude_input)
                    .speed(0.5)
                    .clamp_range(0.0..=MAX_ALTITUDE)
                    .suffix(" m"),
            );
            if ui.add_enabled(idle, egui::Button::new("Set")).clicked() {
                action = Some(DroneAction::SetAltitude(self.altitude_input));
            }
        });

        if let Some(command) = self.awaiting {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(format!("Sending {}...", command));
            });
        }

        if let Some(action) = action {
            self.request(action);
        }
    }
}

impl eframe::App for GroundStationApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.events.try_recv() {
            self.apply_event(event);
        }

        egui::TopBottomPanel::top("connection").show(ctx, |ui| {
            self.connection_bar(ui);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.controls(ui);
        });

        let toasts = self.alerts.active(Instant::now());
        if !toasts.is_empty() {
            egui::Window::new("ground_toasts")
                .title_bar(false)
                .resizable(false)
                .movable(false)
                .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -10.0])
                .show(ctx, |ui| {
                    for toast in toasts {
                        ui.label(&toast.message);
                    }
                });
        }

        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use std::sync::mpsc;

    fn app() -> (GroundStationApp, Receiver<DroneRequest>) {
        let (tx_req, rx_req) = mpsc::channel();
        let (_tx_event, rx_event) = mpsc::channel();
        let app = GroundStationApp::new(AppSettings::default(), tx_req, rx_event);
        (app, rx_req)
    }

    fn port(name: &str) -> SerialPortInfo {
        SerialPortInfo { port: name.into(), description: String::new(), hwid: String::new() }
    }

    #[test]
    fn test_ports_listed_at_startup_and_first_selected() {
        let (mut app, requests) = app();
        assert!(matches!(requests.try_recv().unwrap(), DroneRequest::ListPorts));

        app.apply_event(DroneEvent::Ports(Ok(vec![port("COM3"), port("COM4")])));
        assert_eq!(app.selected_port, "COM3");

        app.connect();
        match requests.try_recv().unwrap() {
            DroneRequest::Connect { port, baudrate } => {
                assert_eq!(port, "COM3");
                assert_eq!(baudrate, 115200);
            }
            _ => panic!("Expected a connect request"),
        }
    }

    #[test]
    fn test_commands_rejected_until_connected() {
        let (mut app, requests) = app();
        requests.try_iter().for_each(drop);

        app.request(DroneAction::ToggleArm);
        assert!(requests.try_recv().is_err());
        assert!(app.awaiting.is_none());
    }

    #[test]
    fn test_state_follows_acknowledgements() {
        let (mut app, requests) = app();
        requests.try_iter().for_each(drop);
        app.apply_event(DroneEvent::Connected { port: "COM3".into(), result: Ok(()) });

        app.request(DroneAction::ToggleArm);
        assert!(matches!(requests.try_recv().unwrap(), DroneRequest::Send(DroneCommand::Arm)));
        assert!(!app.drone.state.armed, "Not armed before the ack");

        app.request(DroneAction::Launch);
        assert!(requests.try_recv().is_err(), "Blocked while a command is in flight");

        app.apply_event(DroneEvent::Sent { command: DroneCommand::Arm, result: Ok(serde_json::json!({})) });
        assert!(app.drone.state.armed);

        app.request(DroneAction::Launch);
        app.apply_event(DroneEvent::Sent {
            command: DroneCommand::Launch,
            result: Err(BackendError::Device("Serial port not connected".into())),
        });
        assert!(!app.drone.state.flying);
        assert!(app.awaiting.is_none());
    }

    #[test]
    fn test_launch_unarmed_sends_nothing() {
        let (mut app, requests) = app();
        requests.try_iter().for_each(drop);
        app.apply_event(DroneEvent::Connected { port: "COM3".into(), result: Ok(()) });

        app.request(DroneAction::Launch);
        assert!(requests.try_recv().is_err());
        assert!(app.awaiting.is_none());
        assert!(!app.drone.state.flying);
    }

    #[test]
    fn test_armed_launch_flies_once_acknowledged() {
        let (mut app, requests) = app();
        requests.try_iter().for_each(drop);
        app.apply_event(DroneEvent::Connected { port: "COM3".into(), result: Ok(()) });
        app.request(DroneAction::ToggleArm);
        app.apply_event(DroneEvent::Sent { command: DroneCommand::Arm, result: Ok(serde_json::json!({})) });
        requests.try_iter().for_each(drop);

        app.request(DroneAction::Launch);
        assert!(matches!(requests.try_recv().unwrap(), DroneRequest::Send(DroneCommand::Launch)));
        assert!(!app.drone.state.flying);
        app.apply_event(DroneEvent::Sent { command: DroneCommand::Launch, result: Ok(serde_json::json!({})) });
        assert!(app.drone.state.flying);
    }

    #[test]
    fn test_connect_without_port_sends_nothing() {
        let (mut app, requests) = app();
        requests.try_iter().for_each(drop);

        app.connect();
        assert!(requests.try_recv().is_err());
        assert!(!app.connecting);
        assert_eq!(app.alerts.active(Instant::now())[0].message, "No port selected");
    }
}
