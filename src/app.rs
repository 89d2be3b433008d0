// All state lives on `PourdeckApp` and is only touched on the UI thread.
// Backend calls go through the service channel and come back as events that
// `apply_event` folds in at the start of each frame.

use crate::alert::{AlertKind, Alerts, FocusTracker};
use crate::matching::{self, ALL_TYPES};
use crate::model::{Ingredient, IngredientRef, Recipe};
use crate::pipes::{PipeAssignment, PipeValue, PRESET_PIPE_COUNTS};
use crate::search::{Debouncer, Sequencer};
use crate::selection::SelectionSet;
use crate::service::{BackendEvent, BackendRequest};
use crate::settings::AppSettings;
use crate::submission::{ImageFile, IngredientForm, RecipeForm};
use crate::view::{Panel, ViewController};
use eframe::egui;
use log::{info, warn};
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

const NO_COCKTAILS: &str = "No Cocktails Found, Please Assign Proper Ingredients";
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

pub struct PourdeckApp {
    settings: AppSettings,
    requests: Sender<BackendRequest>,
    events: Receiver<BackendEvent>,

    view: ViewController,
    alerts: Alerts,
    focus: FocusTracker,
    text_focused: bool,

    // Catalog
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
    ingredient_seq: Sequencer,
    recipe_seq: Sequencer,

    // Ingredient browser
    ingredient_search: String,
    ingredient_filter: String,
    ingredient_type: String,
    ingredient_debounce: Debouncer,
    pending_ingredient_filter: String,

    // Recipe catalog
    recipe_search: String,
    recipe_filter: String,
    recipe_debounce: Debouncer,
    pending_recipe_filter: String,

    // Pipes
    selection: SelectionSet,
    pipes: PipeAssignment,
    pipe_count_input: String,

    // Forms
    ingredient_form: IngredientForm,
    recipe_form: RecipeForm,
    recipe_ingredient_search: String,
    submitting: bool,

    drink_type: String,
    dispatching: bool,
}

impl PourdeckApp {
    pub fn new(
        settings: AppSettings,
        requests: Sender<BackendRequest>,
        events: Receiver<BackendEvent>,
    ) -> Self {
        let drink_type = settings.drink_types.first().cloned().unwrap_or_default();
        let debounce = settings.search_debounce();
        let mut app = Self {
            settings,
            requests,
            events,
            view: ViewController::default(),
            alerts: Alerts::default(),
            focus: FocusTracker::default(),
            text_focused: false,
            ingredients: Vec::new(),
            recipes: Vec::new(),
            ingredient_seq: Sequencer::default(),
            recipe_seq: Sequencer::default(),
            ingredient_search: String::new(),
            ingredient_filter: String::new(),
            ingredient_type: ALL_TYPES.to_string(),
            ingredient_debounce: Debouncer::new(debounce),
            pending_ingredient_filter: String::new(),
            recipe_search: String::new(),
            recipe_filter: String::new(),
            recipe_debounce: Debouncer::new(debounce),
            pending_recipe_filter: String::new(),
            selection: SelectionSet::new(),
            pipes: PipeAssignment::default(),
            pipe_count_input: String::new(),
            ingredient_form: IngredientForm::default(),
            recipe_form: RecipeForm::default(),
            recipe_ingredient_search: String::new(),
            submitting: false,
            drink_type,
            dispatching: false,
        };

        // Startup: saved configuration plus both catalogs.
        app.send(BackendRequest::LoadConfig);
        app.reload_ingredients(String::new());
        app.reload_recipes(String::new());
        app
    }

    fn send(&mut self, request: BackendRequest) -> bool {
        if self.requests.send(request).is_err() {
            warn!("[APP] Backend service is gone");
            self.alerts.error("Backend service stopped. Please restart the application.");
            return false;
        }
        true
    }

    fn reload_ingredients(&mut self, filter: String) {
        let seq = self.ingredient_seq.issue();
        self.pending_ingredient_filter = filter;
        self.send(BackendRequest::LoadIngredients { seq });
    }

    fn reload_recipes(&mut self, filter: String) {
        let seq = self.recipe_seq.issue();
        self.pending_recipe_filter = filter;
        self.send(BackendRequest::LoadRecipes { seq });
    }

    pub fn apply_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Ingredients { seq, result } => {
                if !self.ingredient_seq.is_current(seq) {
                    info!("[APP] Dropping stale ingredient listing {}", seq);
                    return;
                }
                match result {
                    Ok(list) => {
                        self.ingredients = list;
                        self.ingredient_filter = std::mem::take(&mut self.pending_ingredient_filter);
                        if self.ingredient_form.id.is_empty() {
                            self.ingredient_form.id =
                                matching::next_ingredient_id(&self.ingredients).to_string();
                        }
                    }
                    Err(e) => self.alerts.error(format!("Error loading ingredients: {}", e)),
                }
            }
            BackendEvent::Recipes { seq, result } => {
                if !self.recipe_seq.is_current(seq) {
                    info!("[APP] Dropping stale cocktail listing {}", seq);
                    return;
                }
                match result {
                    Ok(list) => {
                        self.recipes = list;
                        self.recipe_filter = std::mem::take(&mut self.pending_recipe_filter);
                        if self.recipe_form.id.is_empty() {
                            self.recipe_form.id = matching::next_recipe_id(&self.recipes).to_string();
                        }
                    }
                    Err(e) => self.alerts.error(format!("Error loading cocktails: {}", e)),
                }
            }
            BackendEvent::ConfigLoaded(Ok(doc)) => match PipeAssignment::load(&doc) {
                Ok((selection, pipes)) => {
                    if !pipes.is_empty() {
                        let restored = format!("Restored {} pipes from the saved configuration.", pipes.count());
                        self.alerts.info(restored);
                    }
                    self.selection = selection;
                    self.pipe_count_input = if pipes.is_empty() { String::new() } else { pipes.count().to_string() };
                    self.pipes = pipes;
                }
                Err(e) => self.alerts.error(format!("Error loading configuration: {}", e)),
            },
            BackendEvent::ConfigLoaded(Err(e)) => {
                warn!("[APP] No saved configuration: {}", e);
                self.alerts.warning("No saved configuration found.");
            }
            BackendEvent::ConfigSaved(Ok(())) => self.alerts.success("Configuration saved successfully!"),
            BackendEvent::ConfigSaved(Err(e)) => {
                self.alerts.error(format!("Error saving configuration: {}", e))
            }
            BackendEvent::IngredientAdded(result) => {
                self.submitting = false;
                match result {
                    Ok(done) => {
                        self.alerts.success("Ingredient added successfully!");
                        if !done.processed {
                            self.alerts.warning("Image processing is taking longer than expected.");
                        }
                        let next = self
                            .ingredient_form
                            .id
                            .trim()
                            .parse::<u32>()
                            .map_or_else(
                                |_| matching::next_ingredient_id(&self.ingredients),
                                |id| id.saturating_add(1),
                            );
                        self.ingredient_form.reset(next);
                        self.reload_ingredients(self.ingredient_filter.clone());
                    }
                    Err(e) => self.alerts.modal(e.to_string()),
                }
            }
            BackendEvent::RecipeAdded(result) => {
                self.submitting = false;
                match result {
                    Ok(done) => {
                        self.alerts.success("Cocktail added successfully!");
                        if !done.processed {
                            self.alerts.warning("Image processing is taking longer than expected.");
                        }
                        let submitted = self.recipe_form.id.trim().parse::<u32>().unwrap_or(0);
                        let next = submitted.saturating_add(1).max(matching::next_recipe_id(&self.recipes));
                        self.recipe_form.reset(next);
                        self.reload_recipes(self.recipe_filter.clone());
                    }
                    Err(e) => self.alerts.modal(e.to_string()),
                }
            }
            BackendEvent::Dispatched(result) => {
                self.dispatching = false;
                match result {
                    Ok(()) => self.alerts.success("Your drink is being prepared."),
                    Err(e) => self.alerts.modal(e.to_string()),
                }
            }
        }
    }

    fn generate_pipes(&mut self) {
        // Non-numeric input is treated like an out-of-range count.
        let count = self.pipe_count_input.trim().parse().unwrap_or(0);
        if let Err(e) = self.pipes.generate(count, &self.selection) {
            self.alerts.modal(e.to_string());
        }
    }

    fn save_config(&mut self) {
        let doc = self.pipes.serialize(&self.selection);
        self.send(BackendRequest::SaveConfig(doc));
    }

    fn dispatch(&mut self) {
        match self.pipes.dispatch_request(self.view.selected_recipe(), &self.drink_type) {
            Ok(request) => self.dispatching = self.send(BackendRequest::Dispatch(request)),
            Err(e) => self.alerts.modal(e.to_string()),
        }
    }

    fn submit_ingredient(&mut self) {
        match self.ingredient_form.validate() {
            Ok(ingredient) => self.submitting = self.send(BackendRequest::AddIngredient(ingredient)),
            Err(e) => self.alerts.modal(e.to_string()),
        }
    }

    fn submit_recipe(&mut self) {
        match self.recipe_form.validate() {
            Ok(recipe) => self.submitting = self.send(BackendRequest::AddRecipe(recipe)),
            Err(e) => self.alerts.modal(e.to_string()),
        }
    }

    fn pick_image(&mut self) -> Option<ImageFile> {
        let path = rfd::FileDialog::new().add_filter("Images", &IMAGE_EXTENSIONS).pick_file()?;
        match ImageFile::read(&path) {
            Ok(image) => Some(image),
            Err(e) => {
                self.alerts.error(format!("{:#}", e));
                None
            }
        }
    }

    fn poll_searches(&mut self, now: Instant) {
        if let Some(term) = self.ingredient_debounce.poll(now) {
            self.reload_ingredients(term);
        }
        if let Some(term) = self.recipe_debounce.poll(now) {
            self.reload_recipes(term);
        }
    }

    // ---- panels ----

    fn nav_bar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Pourdeck");
        ui.separator();
        for panel in Panel::NAV {
            let active = self.view.is_nav_active(panel);
            if ui.add_sized([160.0, 32.0], egui::SelectableLabel::new(active, panel.title())).clicked() {
                self.view.navigate(panel);
            }
        }
    }

    fn availability_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Available Cocktails");
        ui.label(format!("{} ingredients selected", self.selection.count()));
        ui.separator();

        let available = matching::find_available(&self.selection, &self.recipes);
        if available.is_empty() {
            ui.label(NO_COCKTAILS);
            return;
        }
        let mut open = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for recipe in available {
                ui.horizontal(|ui| {
                    if ui.button(&recipe.name).clicked() {
                        open = Some(recipe.id);
                    }
                    ui.weak(&recipe.category);
                });
            }
        });
        if let Some(id) = open {
            self.view.open_recipe(id);
        }
    }

    fn ingredient_browser(&mut self, ui: &mut egui::Ui) {
        ui.heading("Ingredients");
        ui.horizontal(|ui| {
            ui.label("Search:");
            let r = ui.text_edit_singleline(&mut self.ingredient_search);
            self.text_focused |= r.has_focus();
            if r.changed() {
                self.ingredient_debounce.input(self.ingredient_search.clone(), Instant::now());
            }
        });
        ui.horizontal_wrapped(|ui| {
            ui.selectable_value(&mut self.ingredient_type, ALL_TYPES.to_string(), "All");
            for kind in matching::ingredient_types(&self.ingredients) {
                ui.selectable_value(&mut self.ingredient_type, kind.clone(), kind);
            }
        });
        ui.separator();

        let listing =
            matching::browse_ingredients(&self.ingredients, &self.ingredient_filter, &self.ingredient_type);
        if listing.is_empty() {
            ui.label("No ingredients found.");
            return;
        }
        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("ingredient_listing").striped(true).show(ui, |ui| {
                for ingredient in listing {
                    ui.label(ingredient.id.to_string());
                    ui.label(&ingredient.name);
                    ui.weak(&ingredient.kind);
                    ui.end_row();
                }
            });
        });
    }

    fn recipe_catalog(&mut self, ui: &mut egui::Ui) {
        ui.heading("Cocktails");
        ui.horizontal(|ui| {
            ui.label("Search:");
            let r = ui.text_edit_singleline(&mut self.recipe_search);
            self.text_focused |= r.has_focus();
            if r.changed() {
                self.recipe_debounce.input(self.recipe_search.clone(), Instant::now());
            }
        });
        ui.separator();

        let needle = self.recipe_filter.trim().to_lowercase();
        let mut open = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            let mut shown = 0;
            for recipe in self.recipes.iter().filter(|r| r.name.to_lowercase().contains(&needle)) {
                shown += 1;
                ui.horizontal(|ui| {
                    if ui.button(&recipe.name).clicked() {
                        open = Some(recipe.id);
                    }
                    let missing = matching::missing_ingredients(recipe, &self.selection).len();
                    if missing == 0 {
                        ui.colored_label(egui::Color32::GREEN, "available");
                    } else {
                        ui.weak(format!("{} missing", missing));
                    }
                });
            }
            if shown == 0 {
                ui.label("No cocktails found.");
            }
        });
        if let Some(id) = open {
            self.view.open_recipe(id);
        }
    }

    fn recipe_detail(&mut self, ui: &mut egui::Ui) {
        let Some(recipe) = self
            .view
            .selected_recipe()
            .and_then(|id| self.recipes.iter().find(|r| r.id == id))
        else {
            ui.label("Cocktail not found.");
            if ui.button("Back").clicked() {
                self.view.back();
            }
            return;
        };

        ui.heading(&recipe.name);
        ui.weak(&recipe.category);
        ui.separator();
        ui.label(&recipe.description);
        ui.add_space(8.0);

        ui.strong("Ingredients");
        let missing = matching::missing_ingredients(recipe, &self.selection);
        for ingredient in &recipe.ingredients {
            if missing.iter().any(|m| m.id == ingredient.id) {
                ui.colored_label(egui::Color32::LIGHT_RED, format!("{} (not assigned)", ingredient.name));
            } else {
                ui.label(&ingredient.name);
            }
        }
        if !recipe.instructions.is_empty() {
            ui.add_space(8.0);
            ui.strong("Instructions");
            ui.label(&recipe.instructions);
        }

        ui.separator();
        ui.horizontal(|ui| {
            for kind in &self.settings.drink_types {
                ui.radio_value(&mut self.drink_type, kind.clone(), kind);
            }
        });
        let mut pour = false;
        let mut back = false;
        ui.horizontal(|ui| {
            pour = ui
                .add_enabled(!self.dispatching && missing.is_empty(), egui::Button::new("Pour"))
                .clicked();
            back = ui.button("Back").clicked();
        });
        if pour {
            self.dispatch();
        }
        if back {
            self.view.back();
        }
    }

    fn pipe_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Assign Ingredients");
        ui.horizontal(|ui| {
            ui.label(format!("Selected: {}/{}", self.selection.count(), self.selection.capacity()));
            if ui.button("Clear All").clicked() {
                self.selection.clear();
            }
        });

        egui::ScrollArea::vertical().id_source("pipe_selection").max_height(220.0).show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for ingredient in &self.ingredients {
                    // Re-derived from the set every frame, so a rejected add snaps back.
                    let mut checked = self.selection.contains(ingredient.name.as_str());
                    if ui.checkbox(&mut checked, &ingredient.name).changed() {
                        if let Err(e) = self.selection.toggle(ingredient.name.clone()) {
                            self.alerts.warning(e.to_string());
                        }
                    }
                }
            });
        });
        ui.separator();

        let mut generate = false;
        ui.horizontal(|ui| {
            ui.label("Number of pipes:");
            let r = ui.add(egui::TextEdit::singleline(&mut self.pipe_count_input).desired_width(60.0));
            self.text_focused |= r.has_focus();
            for preset in PRESET_PIPE_COUNTS {
                if ui.button(preset.to_string()).clicked() {
                    self.pipe_count_input = preset.to_string();
                    generate = true;
                }
            }
            generate |= ui.button("Generate").clicked();
        });
        if generate {
            self.generate_pipes();
        }

        let mut change: Option<(u32, Option<String>)> = None;
        egui::ScrollArea::vertical().id_source("pipe_slots").show(ui, |ui| {
            egui::Grid::new("pipe_grid").num_columns(2).show(ui, |ui| {
                for (pipe, slot) in self.pipes.slots() {
                    ui.label(format!("Pipe {}", pipe));
                    let shown = match &slot.value {
                        PipeValue::Empty => "Select Ingredient",
                        value => value.as_str(),
                    };
                    egui::ComboBox::from_id_source(("pipe", pipe)).selected_text(shown).show_ui(ui, |ui| {
                        if ui.selectable_label(slot.value == PipeValue::Empty, "Select Ingredient").clicked() {
                            change = Some((pipe, None));
                        }
                        for option in &slot.options {
                            let selected = slot.value.as_str() == option.as_str();
                            if ui.selectable_label(selected, option).clicked() {
                                change = Some((pipe, Some(option.clone())));
                            }
                        }
                    });
                    ui.end_row();
                }
            });
        });
        if let Some((pipe, name)) = change {
            if let Err(e) = self.pipes.assign(pipe, name.as_deref()) {
                self.alerts.error(e.to_string());
            }
        }

        ui.separator();
        if ui.button("Save Configuration").clicked() {
            self.save_config();
        }
    }

    fn add_ingredient_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Add Ingredient");
        let mut pick = false;
        let mut submit = false;
        egui::Grid::new("ingredient_form").num_columns(2).show(ui, |ui| {
            ui.label("Ingredient ID");
            self.text_focused |= ui.text_edit_singleline(&mut self.ingredient_form.id).has_focus();
            ui.end_row();

            ui.label("Ingredient Name");
            self.text_focused |= ui.text_edit_singleline(&mut self.ingredient_form.name).has_focus();
            ui.end_row();

            ui.label("Ingredient Type");
            egui::ComboBox::from_id_source("ingredient_kind")
                .selected_text(&self.ingredient_form.kind)
                .show_ui(ui, |ui| {
                    for kind in matching::ingredient_types(&self.ingredients) {
                        ui.selectable_value(&mut self.ingredient_form.kind, kind.clone(), kind);
                    }
                });
            ui.end_row();

            ui.label("Image");
            ui.horizontal(|ui| {
                pick = ui.button("Choose...").clicked();
                match &self.ingredient_form.image {
                    Some(image) => ui.label(&image.file_name),
                    None => ui.weak("No file chosen"),
                };
            });
            ui.end_row();
        });
        ui.separator();
        ui.horizontal(|ui| {
            submit = ui.add_enabled(!self.submitting, egui::Button::new("Add Ingredient")).clicked();
            if self.submitting {
                ui.spinner();
            }
        });

        if pick {
            if let Some(image) = self.pick_image() {
                self.ingredient_form.image = Some(image);
            }
        }
        if submit {
            self.submit_ingredient();
        }
    }

    fn add_recipe_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Add Cocktail");
        let mut pick = false;
        let mut submit = false;
        egui::Grid::new("recipe_form").num_columns(2).show(ui, |ui| {
            ui.label("Cocktail ID");
            self.text_focused |= ui.text_edit_singleline(&mut self.recipe_form.id).has_focus();
            ui.end_row();

            ui.label("Cocktail Name");
            self.text_focused |= ui.text_edit_singleline(&mut self.recipe_form.name).has_focus();
            ui.end_row();

            ui.label("Cocktail Type");
            self.text_focused |= ui.text_edit_singleline(&mut self.recipe_form.category).has_focus();
            ui.end_row();

            ui.label("Description");
            self.text_focused |= ui.text_edit_multiline(&mut self.recipe_form.description).has_focus();
            ui.end_row();

            ui.label("Instructions");
            self.text_focused |= ui.text_edit_multiline(&mut self.recipe_form.instructions).has_focus();
            ui.end_row();

            ui.label("Image");
            ui.horizontal(|ui| {
                pick = ui.button("Choose...").clicked();
                match &self.recipe_form.image {
                    Some(image) => ui.label(&image.file_name),
                    None => ui.weak("No file chosen"),
                };
            });
            ui.end_row();
        });

        ui.separator();
        ui.label(format!(
            "Ingredients ({}/{})",
            self.recipe_form.ingredients.count(),
            self.recipe_form.ingredients.capacity()
        ));
        let mut remove = None;
        ui.horizontal_wrapped(|ui| {
            for chosen in self.recipe_form.ingredients.iter() {
                if ui.small_button(format!("{} ✖", chosen.name)).clicked() {
                    remove = Some(chosen.id);
                }
            }
        });
        if let Some(id) = remove {
            self.recipe_form.ingredients.remove(&id);
        }

        ui.horizontal(|ui| {
            ui.label("Find:");
            self.text_focused |= ui.text_edit_singleline(&mut self.recipe_ingredient_search).has_focus();
        });
        egui::ScrollArea::vertical().id_source("recipe_ingredients").max_height(200.0).show(ui, |ui| {
            for ingredient in matching::browse_ingredients(&self.ingredients, &self.recipe_ingredient_search, ALL_TYPES) {
                let mut checked = self.recipe_form.ingredients.contains(&ingredient.id);
                if ui.checkbox(&mut checked, &ingredient.name).changed() {
                    if let Err(e) = self.recipe_form.ingredients.toggle(IngredientRef::from(ingredient)) {
                        self.alerts.warning(e.to_string());
                    }
                }
            }
        });

        ui.separator();
        ui.horizontal(|ui| {
            submit = ui.add_enabled(!self.submitting, egui::Button::new("Add Cocktail")).clicked();
            if self.submitting {
                ui.spinner();
            }
        });

        if pick {
            if let Some(image) = self.pick_image() {
                self.recipe_form.image = Some(image);
            }
        }
        if submit {
            self.submit_recipe();
        }
    }

    fn show_overlays(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.alerts.current_modal().map(str::to_string) {
            egui::Window::new("Notice")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.separator();
                    if ui.button("OK").clicked() {
                        self.alerts.dismiss_modal();
                    }
                });
        }

        if self.dispatching {
            egui::Window::new("Preparing")
                .title_bar(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Preparing your drink...");
                    });
                });
        }

        let toasts = self.alerts.active(Instant::now());
        if !toasts.is_empty() {
            egui::Window::new("toasts")
                .title_bar(false)
                .resizable(false)
                .movable(false)
                .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -10.0])
                .show(ctx, |ui| {
                    for toast in toasts {
                        ui.colored_label(toast_color(toast.kind), &toast.message);
                    }
                });
        }
    }
}

fn toast_color(kind: AlertKind) -> egui::Color32 {
    match kind {
        AlertKind::Info => egui::Color32::LIGHT_BLUE,
        AlertKind::Success => egui::Color32::GREEN,
        AlertKind::Warning => egui::Color32::YELLOW,
        AlertKind::Error => egui::Color32::LIGHT_RED,
    }
}

impl eframe::App for PourdeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.events.try_recv() {
            self.apply_event(event);
        }
        let now = Instant::now();
        self.poll_searches(now);
        self.text_focused = false;

        egui::SidePanel::left("nav").resizable(false).show(ctx, |ui| {
            self.nav_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.view.active() {
            Panel::Availability => self.availability_panel(ui),
            Panel::IngredientBrowser => self.ingredient_browser(ui),
            Panel::RecipeCatalog => self.recipe_catalog(ui),
            Panel::RecipeDetail => self.recipe_detail(ui),
            Panel::PipeAssignment => self.pipe_panel(ui),
            Panel::AddIngredient => self.add_ingredient_panel(ui),
            Panel::AddRecipe => self.add_recipe_panel(ui),
        });

        self.show_overlays(ctx);

        if let Some(focused) = self.focus.update(self.text_focused) {
            self.send(BackendRequest::Focus(focused));
        }

        // Keep polling for service events, debounced searches and toast expiry.
        let wake = [
            self.ingredient_debounce.remaining(now),
            self.recipe_debounce.remaining(now),
            Some(Duration::from_millis(250)),
        ];
        if let Some(after) = wake.into_iter().flatten().min() {
            ctx.request_repaint_after(after);
        }
    }
}
