// The UI never blocks on the network. It sends requests over a channel and
// drains the matching events once per frame.

use crate::backend::{Backend, BackendError, DroneLink};
use crate::drone::DroneCommand;
use crate::model::{ConfigDocument, DispatchRequest, Ingredient, Recipe, SerialPortInfo};
use crate::pipes::DispatchError;
use crate::submission::{self, Readiness, SubmitError, Submitted};
use log::{debug, info, warn};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

pub enum BackendRequest {
    LoadIngredients { seq: u64 },
    LoadRecipes { seq: u64 },
    LoadConfig,
    SaveConfig(ConfigDocument),
    AddIngredient(Ingredient),
    AddRecipe(Recipe),
    Dispatch(DispatchRequest),
    Focus(bool),
}

pub enum BackendEvent {
    Ingredients { seq: u64, result: Result<Vec<Ingredient>, BackendError> },
    Recipes { seq: u64, result: Result<Vec<Recipe>, BackendError> },
    ConfigLoaded(Result<ConfigDocument, BackendError>),
    ConfigSaved(Result<(), BackendError>),
    IngredientAdded(Result<Submitted, SubmitError>),
    RecipeAdded(Result<Submitted, SubmitError>),
    Dispatched(Result<(), DispatchError>),
}

pub enum DroneRequest {
    ListPorts,
    Connect { port: String, baudrate: u32 },
    Send(DroneCommand),
}

pub enum DroneEvent {
    Ports(Result<Vec<SerialPortInfo>, BackendError>),
    Connected { port: String, result: Result<(), BackendError> },
    Sent { command: DroneCommand, result: Result<serde_json::Value, BackendError> },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Scheduling {
    /// One worker thread per request.
    Workers,
    /// Requests handled in arrival order on the service thread.
    InOrder,
}

fn spawn_service<R, E, F>(
    name: &'static str,
    scheduling: Scheduling,
    tx_to_app: Sender<E>,
    handle: F,
) -> Sender<R>
where
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(R) -> Option<E> + Send + Sync + 'static,
{
    let (tx_req, rx_req) = mpsc::channel::<R>();
    let handle = Arc::new(handle);

    thread::spawn(move || {
        info!("[SERVICE] {} service started ({:?})", name, scheduling);
        // Ends when every sender is dropped.
        while let Ok(request) = rx_req.recv() {
            match scheduling {
                Scheduling::InOrder => {
                    if let Some(event) = handle(request) {
                        let _ = tx_to_app.send(event);
                    }
                }
                Scheduling::Workers => {
                    let handle = Arc::clone(&handle);
                    let tx = tx_to_app.clone();
                    thread::spawn(move || {
                        if let Some(event) = handle(request) {
                            let _ = tx.send(event);
                        }
                    });
                }
            }
        }
        info!("[SERVICE] {} service stopped", name);
    });

    tx_req
}

pub fn start_backend_service(
    backend: Arc<dyn Backend>,
    readiness: Readiness,
    tx_to_app: Sender<BackendEvent>,
) -> Sender<BackendRequest> {
    spawn_service("Backend", Scheduling::Workers, tx_to_app, move |request| {
        handle_backend(backend.as_ref(), readiness, request)
    })
}

fn handle_backend(
    backend: &dyn Backend,
    readiness: Readiness,
    request: BackendRequest,
) -> Option<BackendEvent> {
    let event = match request {
        BackendRequest::LoadIngredients { seq } => {
            BackendEvent::Ingredients { seq, result: backend.ingredients() }
        }
        BackendRequest::LoadRecipes { seq } => BackendEvent::Recipes { seq, result: backend.recipes() },
        BackendRequest::LoadConfig => BackendEvent::ConfigLoaded(backend.load_config()),
        BackendRequest::SaveConfig(doc) => BackendEvent::ConfigSaved(backend.save_config(&doc)),
        BackendRequest::AddIngredient(ingredient) => BackendEvent::IngredientAdded(
            submission::submit_ingredient(backend, &ingredient, readiness),
        ),
        BackendRequest::AddRecipe(recipe) => {
            BackendEvent::RecipeAdded(submission::submit_recipe(backend, &recipe, readiness))
        }
        BackendRequest::Dispatch(request) => {
            let result = backend.send_pipes(&request).map_err(DispatchError::from);
            if let Err(e) = &result {
                warn!("[SERVICE] Dispatch of product {} failed: {}", request.product_id, e);
            }
            BackendEvent::Dispatched(result)
        }
        BackendRequest::Focus(focused) => {
            // Keyboard relay is best effort; nothing to report back.
            if let Err(e) = backend.notify_focus(focused) {
                debug!("[SERVICE] Focus relay failed: {}", e);
            }
            return None;
        }
    };
    Some(event)
}

/// Serial commands must reach the device in the order they were issued, so
/// the drone service handles one request at a time.
pub fn start_drone_service(
    link: Arc<dyn DroneLink>,
    tx_to_app: Sender<DroneEvent>,
) -> Sender<DroneRequest> {
    spawn_service("Drone", Scheduling::InOrder, tx_to_app, move |request| {
        Some(handle_drone(link.as_ref(), request))
    })
}

fn handle_drone(link: &dyn DroneLink, request: DroneRequest) -> DroneEvent {
    match request {
        DroneRequest::ListPorts => DroneEvent::Ports(link.list_ports()),
        DroneRequest::Connect { port, baudrate } => {
            let result = link.connect(&port, baudrate);
            DroneEvent::Connected { port, result }
        }
        DroneRequest::Send(command) => {
            debug!("[SERVICE] Sending {}", command);
            DroneEvent::Sent { command, result: link.send_command(&command.to_string()) }
        }
    }
}
