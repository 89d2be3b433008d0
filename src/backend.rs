use crate::model::{ConfigDocument, DispatchRequest, Ingredient, Recipe, SerialPortInfo};
use log::{debug, info, warn};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success reply; the body is what the user sees.
    #[error("{body}")]
    Rejected { status: u16, body: String },
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid backend address: {0}")]
    Address(#[from] url::ParseError),
    #[error("{0}")]
    Device(String),
}

/// Catalog, configuration and dispatch endpoints of the machine backend.
pub trait Backend: Send + Sync {
    fn ingredients(&self) -> Result<Vec<Ingredient>, BackendError>;
    fn recipes(&self) -> Result<Vec<Recipe>, BackendError>;
    fn add_ingredient(&self, ingredient: &Ingredient) -> Result<(), BackendError>;
    fn add_recipe(&self, recipe: &Recipe) -> Result<(), BackendError>;
    fn load_config(&self) -> Result<ConfigDocument, BackendError>;
    fn save_config(&self, doc: &ConfigDocument) -> Result<(), BackendError>;
    fn send_pipes(&self, request: &DispatchRequest) -> Result<(), BackendError>;
    /// True once the backend finished post-processing the last upload.
    fn processing_complete(&self) -> Result<bool, BackendError>;
    fn clear_processing_flag(&self) -> Result<(), BackendError>;
    /// Tells the kiosk host to show or hide its on-screen keyboard.
    fn notify_focus(&self, focused: bool) -> Result<(), BackendError>;
}

/// Serial relay used by the ground station.
pub trait DroneLink: Send + Sync {
    fn list_ports(&self) -> Result<Vec<SerialPortInfo>, BackendError>;
    fn connect(&self, port: &str, baudrate: u32) -> Result<(), BackendError>;
    fn send_command(&self, command: &str) -> Result<serde_json::Value, BackendError>;
}

pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        info!("[BACKEND] Using {}", base);
        Ok(Self { client, base })
    }

    // Always relative to the base, so a path prefix such as `/api/` is kept.
    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.endpoint(path)?;
        debug!("[BACKEND] GET {}", url);
        let body = expect_success(self.client.get(url).send()?)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, BackendError> {
        let url = self.endpoint(path)?;
        debug!("[BACKEND] POST {}", url);
        expect_success(self.client.post(url).json(body).send()?)
    }

    fn post_empty(&self, path: &str) -> Result<String, BackendError> {
        let url = self.endpoint(path)?;
        debug!("[BACKEND] POST {}", url);
        expect_success(self.client.post(url).send()?)
    }
}

fn expect_success(response: Response) -> Result<String, BackendError> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text()?;
    if !status.is_success() {
        warn!("[BACKEND] {} returned {}: {}", url, status, body.trim());
        return Err(BackendError::Rejected { status: status.as_u16(), body });
    }
    Ok(body)
}

/// The dispatch endpoint answers with the literal text `OK`; anything else is
/// the failure message.
pub fn interpret_dispatch_reply(status: u16, body: &str) -> Result<(), BackendError> {
    if (200..300).contains(&status) && body.trim() == "OK" {
        return Ok(());
    }
    Err(BackendError::Rejected { status, body: body.trim().to_string() })
}

/// `/send_command` replies 200 with an `error` field when the relay fails.
pub fn interpret_command_reply(reply: serde_json::Value) -> Result<serde_json::Value, BackendError> {
    match reply.get("error").and_then(|e| e.as_str()) {
        Some(message) => Err(BackendError::Device(message.to_string())),
        None => Ok(reply),
    }
}

/// The serial relay reports failures as `{"error": "..."}` bodies.
fn relay_error(err: BackendError) -> BackendError {
    match err {
        BackendError::Rejected { status, body } => {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));
            match message {
                Some(message) => BackendError::Device(message),
                None => BackendError::Rejected { status, body },
            }
        }
        other => other,
    }
}

impl Backend for HttpBackend {
    fn ingredients(&self) -> Result<Vec<Ingredient>, BackendError> {
        self.get_json("db.json")
    }

    fn recipes(&self) -> Result<Vec<Recipe>, BackendError> {
        self.get_json("products.json")
    }

    fn add_ingredient(&self, ingredient: &Ingredient) -> Result<(), BackendError> {
        self.post_json("addIngredient", ingredient).map(|_| ())
    }

    fn add_recipe(&self, recipe: &Recipe) -> Result<(), BackendError> {
        self.post_json("addCocktail", recipe).map(|_| ())
    }

    fn load_config(&self) -> Result<ConfigDocument, BackendError> {
        self.get_json("config.json")
    }

    fn save_config(&self, doc: &ConfigDocument) -> Result<(), BackendError> {
        self.post_json("save-config", doc).map(|_| ())
    }

    fn send_pipes(&self, request: &DispatchRequest) -> Result<(), BackendError> {
        let url = self.endpoint("send-pipes")?;
        info!("[BACKEND] Dispatching product {} on {} pipes", request.product_id, request.ingredients.len());
        let response = self.client.post(url).json(request).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        interpret_dispatch_reply(status, &body)
    }

    fn processing_complete(&self) -> Result<bool, BackendError> {
        let url = self.endpoint("processing_complete")?;
        let response = self.client.get(url).send()?;
        Ok(response.status().is_success())
    }

    fn clear_processing_flag(&self) -> Result<(), BackendError> {
        self.post_empty("delete_processing_flag").map(|_| ())
    }

    fn notify_focus(&self, focused: bool) -> Result<(), BackendError> {
        let path = if focused { "focus-in" } else { "focus-out" };
        let reply = self.post_empty(path)?;
        debug!("[BACKEND] {}", reply.trim());
        Ok(())
    }
}

impl DroneLink for HttpBackend {
    fn list_ports(&self) -> Result<Vec<SerialPortInfo>, BackendError> {
        self.get_json("list_ports")
    }

    fn connect(&self, port: &str, baudrate: u32) -> Result<(), BackendError> {
        let body = serde_json::json!({ "port": port, "baudrate": baudrate });
        self.post_json("connect", &body).map(|_| ()).map_err(relay_error)
    }

    fn send_command(&self, command: &str) -> Result<serde_json::Value, BackendError> {
        let body = serde_json::json!({ "command": command });
        let reply = self.post_json("send_command", &body).map_err(relay_error)?;
        interpret_command_reply(serde_json::from_str(&reply)?)
    }
}
