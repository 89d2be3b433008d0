use crate::backend::{Backend, BackendError, DroneLink};
use crate::model::{ConfigDocument, DispatchRequest, Ingredient, Recipe, SerialPortInfo};
use std::sync::{Mutex, MutexGuard};

/// Everything a `FakeBackend` was asked to do, plus knobs for its replies.
#[derive(Default)]
pub struct FakeState {
    pub catalog_ingredients: Vec<Ingredient>,
    pub catalog_recipes: Vec<Recipe>,
    pub config: ConfigDocument,
    pub ingredients: Vec<Ingredient>,
    pub recipes: Vec<Recipe>,
    pub saved_configs: Vec<ConfigDocument>,
    pub dispatched: Vec<DispatchRequest>,
    pub dispatch_reply: Option<String>,
    pub reject_with: Option<String>,
    pub ready_after: Option<u32>,
    pub readiness_checks: u32,
    pub flag_cleared: u32,
    pub focus: Vec<bool>,
    pub ports: Vec<SerialPortInfo>,
    pub connected: Option<(String, u32)>,
    pub commands: Vec<String>,
    pub command_error: Option<String>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn rejected(&self) -> Result<(), BackendError> {
        match &self.state().reject_with {
            Some(body) => Err(BackendError::Rejected { status: 500, body: body.clone() }),
            None => Ok(()),
        }
    }
}

impl Backend for FakeBackend {
    fn ingredients(&self) -> Result<Vec<Ingredient>, BackendError> {
        self.rejected()?;
        Ok(self.state().catalog_ingredients.clone())
    }

    fn recipes(&self) -> Result<Vec<Recipe>, BackendError> {
        self.rejected()?;
        Ok(self.state().catalog_recipes.clone())
    }

    fn add_ingredient(&self, ingredient: &Ingredient) -> Result<(), BackendError> {
        self.rejected()?;
        self.state().ingredients.push(ingredient.clone());
        Ok(())
    }

    fn add_recipe(&self, recipe: &Recipe) -> Result<(), BackendError> {
        self.rejected()?;
        self.state().recipes.push(recipe.clone());
        Ok(())
    }

    fn load_config(&self) -> Result<ConfigDocument, BackendError> {
        self.rejected()?;
        Ok(self.state().config.clone())
    }

    fn save_config(&self, doc: &ConfigDocument) -> Result<(), BackendError> {
        self.rejected()?;
        self.state().saved_configs.push(doc.clone());
        Ok(())
    }

    fn send_pipes(&self, request: &DispatchRequest) -> Result<(), BackendError> {
        let mut state = self.state();
        state.dispatched.push(request.clone());
        let reply = state.dispatch_reply.clone().unwrap_or_else(|| "OK".into());
        crate::backend::interpret_dispatch_reply(200, &reply)
    }

    fn processing_complete(&self) -> Result<bool, BackendError> {
        let mut state = self.state();
        state.readiness_checks += 1;
        Ok(state.ready_after.map_or(false, |n| state.readiness_checks >= n))
    }

    fn clear_processing_flag(&self) -> Result<(), BackendError> {
        self.state().flag_cleared += 1;
        Ok(())
    }

    fn notify_focus(&self, focused: bool) -> Result<(), BackendError> {
        self.state().focus.push(focused);
        Ok(())
    }
}

impl DroneLink for FakeBackend {
    fn list_ports(&self) -> Result<Vec<SerialPortInfo>, BackendError> {
        self.rejected()?;
        Ok(self.state().ports.clone())
    }

    fn connect(&self, port: &str, baudrate: u32) -> Result<(), BackendError> {
        self.rejected()?;
        self.state().connected = Some((port.to_string(), baudrate));
        Ok(())
    }

    fn send_command(&self, command: &str) -> Result<serde_json::Value, BackendError> {
        let mut state = self.state();
        state.commands.push(command.to_string());
        match &state.command_error {
            Some(message) => Err(BackendError::Device(message.clone())),
            None => Ok(serde_json::json!({ "status": "sent", "command": command })),
        }
    }
}
