//! Drone command dispatch.
//!
//! Every action is checked against the local state first; a failed check
//! sends nothing. Commands that pass are relayed to the serial link and the
//! local state only changes once the link acknowledges them.

use crate::backend::BackendError;
use log::info;
use std::fmt;

pub const MAX_ALTITUDE: f32 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightMode {
    #[default]
    Idle,
    Stabilize,
    AltHold,
    Loiter,
    Rtl,
    Auto,
}

impl FlightMode {
    pub const SELECTABLE: [FlightMode; 5] = [
        FlightMode::Stabilize,
        FlightMode::AltHold,
        FlightMode::Loiter,
        FlightMode::Rtl,
        FlightMode::Auto,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FlightMode::Idle => "IDLE",
            FlightMode::Stabilize => "STABILIZE",
            FlightMode::AltHold => "ALTHOLD",
            FlightMode::Loiter => "LOITER",
            FlightMode::Rtl => "RTL",
            FlightMode::Auto => "AUTO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DroneCommand {
    Arm,
    Disarm,
    Launch,
    Land,
    PosHoldOn,
    PosHoldOff,
    Mode(FlightMode),
    Altitude(f32),
}

impl fmt::Display for DroneCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroneCommand::Arm => write!(f, "ARM"),
            DroneCommand::Disarm => write!(f, "DISARM"),
            DroneCommand::Launch => write!(f, "LAUNCH"),
            DroneCommand::Land => write!(f, "LAND"),
            DroneCommand::PosHoldOn => write!(f, "POSHOLD_ON"),
            DroneCommand::PosHoldOff => write!(f, "POSHOLD_OFF"),
            DroneCommand::Mode(mode) => write!(f, "MODE {}", mode.name()),
            DroneCommand::Altitude(alt) => write!(f, "ALT {}", alt),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DroneAction {
    ToggleArm,
    Launch,
    Land,
    TogglePosHold,
    SetMode(FlightMode),
    SetAltitude(f32),
}

#[derive(Debug, thiserror::Error)]
pub enum DroneError {
    #[error("{0}")]
    Precondition(&'static str),
    #[error("Not connected to any port")]
    NotConnected,
    #[error("Failed to send command: {0}")]
    Link(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroneState {
    pub armed: bool,
    pub flying: bool,
    pub pos_hold: bool,
    pub mode: FlightMode,
    pub operating_altitude: f32,
}

impl Default for DroneState {
    fn default() -> Self {
        Self { armed: false, flying: false, pos_hold: false, mode: FlightMode::Idle, operating_altitude: 0.0 }
    }
}

impl DroneState {
    /// Resolve an action to the command it would send, or reject it.
    pub fn plan(&self, action: DroneAction) -> Result<DroneCommand, DroneError> {
        match action {
            DroneAction::ToggleArm => Ok(if self.armed { DroneCommand::Disarm } else { DroneCommand::Arm }),
            DroneAction::Launch => {
                if !self.armed {
                    return Err(DroneError::Precondition("Drone must be armed first"));
                }
                if self.flying {
                    return Err(DroneError::Precondition("Drone is already flying"));
                }
                Ok(DroneCommand::Launch)
            }
            DroneAction::Land => {
                if !self.flying {
                    return Err(DroneError::Precondition("Drone is not flying"));
                }
                Ok(DroneCommand::Land)
            }
            DroneAction::TogglePosHold => {
                if !self.flying {
                    return Err(DroneError::Precondition("Drone must be flying to use position hold"));
                }
                Ok(if self.pos_hold { DroneCommand::PosHoldOff } else { DroneCommand::PosHoldOn })
            }
            DroneAction::SetMode(mode) => Ok(DroneCommand::Mode(mode)),
            DroneAction::SetAltitude(alt) => Ok(DroneCommand::Altitude(alt.clamp(0.0, MAX_ALTITUDE))),
        }
    }

    /// Record an acknowledged command.
    pub fn apply(&mut self, command: DroneCommand) {
        match command {
            DroneCommand::Arm => self.armed = true,
            DroneCommand::Disarm => self.armed = false,
            DroneCommand::Launch => self.flying = true,
            DroneCommand::Land => {
                self.flying = false;
                self.pos_hold = false;
            }
            DroneCommand::PosHoldOn => self.pos_hold = true,
            DroneCommand::PosHoldOff => self.pos_hold = false,
            DroneCommand::Mode(mode) => self.mode = mode,
            DroneCommand::Altitude(alt) => self.operating_altitude = alt,
        }
    }
}

/// Tracks the serial connection and the drone it drives.
#[derive(Debug, Default)]
pub struct DroneController {
    pub state: DroneState,
    port: Option<String>,
}

impl DroneController {
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn set_connected(&mut self, port: impl Into<String>) {
        let port = port.into();
        info!("[DRONE] Connected to {}", port);
        self.port = Some(port);
    }

    /// Precondition checks only; nothing is sent.
    pub fn prepare(&self, action: DroneAction) -> Result<DroneCommand, DroneError> {
        if self.port.is_none() {
            return Err(DroneError::NotConnected);
        }
        self.state.plan(action)
    }

    pub fn acknowledge(&mut self, command: DroneCommand) {
        info!("[DRONE] {} acknowledged", command);
        self.state.apply(command);
    }
}
