use crate::backend::{Backend, BackendError};
use crate::model::{Ingredient, IngredientRef, Recipe};
use crate::selection::SelectionSet;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{info, warn};
use std::path::Path;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image at {:?}", path))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    fn mime(&self) -> &'static str {
        let ext = Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        }
    }

    /// Self-contained `data:` URL, the form the catalogs store images in.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime(), STANDARD.encode(&self.bytes))
    }
}

/// Every problem found in a form, reported together.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", .messages.join("\n"))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

fn check_id(raw: &str, label: &str, messages: &mut Vec<String>) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        messages.push(format!("{} ID is required.", label));
        return None;
    }
    match raw.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            messages.push(format!("{} ID must be a number.", label));
            None
        }
    }
}

fn check_text(value: &str, message: &str, messages: &mut Vec<String>) {
    if value.trim().is_empty() {
        messages.push(message.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngredientForm {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub image: Option<ImageFile>,
}

impl Default for IngredientForm {
    fn default() -> Self {
        Self { id: String::new(), name: String::new(), kind: "Liquid".into(), image: None }
    }
}

impl IngredientForm {
    pub fn validate(&self) -> std::result::Result<Ingredient, ValidationError> {
        let mut messages = Vec::new();
        let id = check_id(&self.id, "Ingredient", &mut messages);
        check_text(&self.name, "Ingredient Name is required.", &mut messages);
        check_text(&self.kind, "Ingredient Type is required.", &mut messages);
        if self.image.is_none() {
            messages.push("Ingredient Image is required.".into());
        }

        match (id, &self.image) {
            (Some(id), Some(image)) if messages.is_empty() => Ok(Ingredient {
                id,
                name: self.name.trim().to_string(),
                kind: self.kind.trim().to_string(),
                image: image.to_data_url(),
            }),
            _ => Err(ValidationError { messages }),
        }
    }

    /// Clear for the next entry, keeping the id the caller assigns.
    pub fn reset(&mut self, next_id: u32) {
        *self = Self { id: next_id.to_string(), ..Self::default() };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeForm {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub instructions: String,
    pub image: Option<ImageFile>,
    pub ingredients: SelectionSet<IngredientRef>,
}

impl Default for RecipeForm {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            category: "Cocktail".into(),
            description: String::new(),
            instructions: String::new(),
            image: None,
            ingredients: SelectionSet::new(),
        }
    }
}

impl RecipeForm {
    pub fn validate(&self) -> std::result::Result<Recipe, ValidationError> {
        let mut messages = Vec::new();
        let id = check_id(&self.id, "Cocktail", &mut messages);
        check_text(&self.name, "Cocktail Name is required.", &mut messages);
        check_text(&self.category, "Cocktail Type is required.", &mut messages);
        check_text(&self.description, "Description is required.", &mut messages);
        if self.image.is_none() {
            messages.push("Cocktail Image is required.".into());
        }
        if self.ingredients.is_empty() {
            messages.push("At least one ingredient is required.".into());
        }

        match (id, &self.image) {
            (Some(id), Some(image)) if messages.is_empty() => Ok(Recipe {
                id,
                name: self.name.trim().to_string(),
                image: image.to_data_url(),
                category: self.category.trim().to_string(),
                description: self.description.trim().to_string(),
                instructions: self.instructions.trim().to_string(),
                ingredients: self.ingredients.to_vec(),
            }),
            _ => Err(ValidationError { messages }),
        }
    }

    pub fn reset(&mut self, next_id: u32) {
        *self = Self { id: next_id.to_string(), ..Self::default() };
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Readiness {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for Readiness {
    fn default() -> Self {
        // 30 x 500ms, roughly 15 seconds
        Self { attempts: 30, interval: Duration::from_millis(500) }
    }
}

/// Poll until the backend reports its post-processing done, then clear the
/// flag. Returns false on timeout.
pub fn wait_for_processing(backend: &dyn Backend, readiness: Readiness) -> bool {
    for attempt in 1..=readiness.attempts {
        match backend.processing_complete() {
            Ok(true) => {
                if let Err(e) = backend.clear_processing_flag() {
                    warn!("[SUBMIT] Failed to clear processing flag: {}", e);
                }
                info!("[SUBMIT] Processing finished after {} checks", attempt);
                return true;
            }
            Ok(false) => {}
            Err(e) => info!("[SUBMIT] Waiting for image processing to complete... ({})", e),
        }
        thread::sleep(readiness.interval);
    }
    warn!("[SUBMIT] Image processing timed out");
    false
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Failed to add the {what}. Server response: {body}")]
    Rejected { what: &'static str, body: String },
    #[error("An error occurred while adding the {what}: {source}")]
    Failed { what: &'static str, source: BackendError },
}

impl SubmitError {
    fn from_backend(what: &'static str, err: BackendError) -> Self {
        match err {
            BackendError::Rejected { body, .. } => SubmitError::Rejected { what, body },
            source => SubmitError::Failed { what, source },
        }
    }
}

/// Outcome of an accepted submission; `processed` is false when the
/// readiness wait timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitted {
    pub processed: bool,
}

pub fn submit_ingredient(
    backend: &dyn Backend,
    ingredient: &Ingredient,
    readiness: Readiness,
) -> std::result::Result<Submitted, SubmitError> {
    info!("[SUBMIT] Adding ingredient {} ({})", ingredient.name, ingredient.id);
    backend
        .add_ingredient(ingredient)
        .map_err(|e| SubmitError::from_backend("ingredient", e))?;
    Ok(Submitted { processed: wait_for_processing(backend, readiness) })
}

pub fn submit_recipe(
    backend: &dyn Backend,
    recipe: &Recipe,
    readiness: Readiness,
) -> std::result::Result<Submitted, SubmitError> {
    info!("[SUBMIT] Adding cocktail {} with {} ingredients", recipe.name, recipe.ingredients.len());
    backend
        .add_recipe(recipe)
        .map_err(|e| SubmitError::from_backend("cocktail", e))?;
    Ok(Submitted { processed: wait_for_processing(backend, readiness) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    fn png() -> ImageFile {
        ImageFile { file_name: "lime.PNG".into(), bytes: vec![1, 2, 3] }
    }

    fn fast() -> Readiness {
        Readiness { attempts: 3, interval: Duration::ZERO }
    }

    #[test]
    fn test_data_url_uses_extension_mime() {
        assert_eq!(png().to_data_url(), "data:image/png;base64,AQID");
        let other = ImageFile { file_name: "blob".into(), bytes: vec![] };
        assert_eq!(other.to_data_url(), "data:application/octet-stream;base64,");
    }

    #[test]
    fn test_image_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mint.jpg");
        std::fs::write(&path, [9u8, 9]).unwrap();
        let image = ImageFile::read(&path).unwrap();
        assert_eq!(image.file_name, "mint.jpg");
        assert!(image.to_data_url().starts_with("data:image/jpeg;base64,"));
        assert!(ImageFile::read(&dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn test_ingredient_form_reports_all_missing_fields() {
        let form = IngredientForm { kind: String::new(), ..IngredientForm::default() };
        let err = form.validate().unwrap_err();
        assert_eq!(
            err.messages,
            vec![
                "Ingredient ID is required.",
                "Ingredient Name is required.",
                "Ingredient Type is required.",
                "Ingredient Image is required.",
            ]
        );
        assert_eq!(err.to_string().lines().count(), 4);
    }

    #[test]
    fn test_ingredient_form_valid() {
        let form = IngredientForm {
            id: "12".into(),
            name: " Lime ".into(),
            kind: "Juice".into(),
            image: Some(png()),
        };
        let ingredient = form.validate().unwrap();
        assert_eq!(ingredient.id, 12);
        assert_eq!(ingredient.name, "Lime");
        assert!(ingredient.image.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_ingredient_form_non_numeric_id() {
        let form = IngredientForm { id: "x1".into(), name: "Lime".into(), image: Some(png()), ..Default::default() };
        assert_eq!(form.validate().unwrap_err().messages, vec!["Ingredient ID must be a number."]);
    }

    #[test]
    fn test_recipe_form_requires_ingredient() {
        let form = RecipeForm {
            id: "3".into(),
            name: "Gimlet".into(),
            description: "Sharp".into(),
            image: Some(png()),
            ..RecipeForm::default()
        };
        assert_eq!(form.validate().unwrap_err().messages, vec!["At least one ingredient is required."]);

        let mut form = form;
        form.ingredients.toggle(IngredientRef { id: 1, name: "Gin".into() }).unwrap();
        let recipe = form.validate().unwrap();
        assert_eq!(recipe.id, 3);
        assert_eq!(recipe.category, "Cocktail");
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.instructions, "", "Instructions are optional");
    }

    #[test]
    fn test_recipe_form_reports_all_missing_fields() {
        let err = RecipeForm { category: " ".into(), ..RecipeForm::default() }.validate().unwrap_err();
        assert_eq!(err.messages.len(), 6);
    }

    #[test]
    fn test_reset_keeps_next_id() {
        let mut form = IngredientForm { id: "4".into(), name: "Lime".into(), kind: "Juice".into(), image: Some(png()) };
        form.reset(5);
        assert_eq!(form, IngredientForm { id: "5".into(), ..IngredientForm::default() });
    }

    #[test]
    fn test_wait_for_processing_clears_flag() {
        let backend = FakeBackend::default();
        backend.state().ready_after = Some(2);
        assert!(wait_for_processing(&backend, fast()));
        let state = backend.state();
        assert_eq!(state.readiness_checks, 2);
        assert_eq!(state.flag_cleared, 1);
    }

    #[test]
    fn test_wait_for_processing_times_out() {
        let backend = FakeBackend::default();
        assert!(!wait_for_processing(&backend, fast()));
        assert_eq!(backend.state().readiness_checks, 3);
        assert_eq!(backend.state().flag_cleared, 0);
    }

    #[test]
    fn test_submit_ingredient_proceeds_after_timeout() {
        let backend = FakeBackend::default();
        let ingredient = Ingredient { id: 1, name: "Lime".into(), kind: "Juice".into(), image: String::new() };
        let outcome = submit_ingredient(&backend, &ingredient, fast()).unwrap();
        assert_eq!(outcome, Submitted { processed: false });
        assert_eq!(backend.state().ingredients, vec![ingredient]);
    }

    #[test]
    fn test_submit_rejection_text_is_verbatim() {
        let backend = FakeBackend::default();
        backend.state().reject_with = Some("Error: products.json file not found".into());
        let recipe = Recipe {
            id: 1,
            name: "Gimlet".into(),
            image: String::new(),
            category: "Cocktail".into(),
            description: String::new(),
            instructions: String::new(),
            ingredients: vec![],
        };
        let err = submit_recipe(&backend, &recipe, fast()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to add the cocktail. Server response: Error: products.json file not found"
        );
        assert_eq!(backend.state().readiness_checks, 0, "No polling after a rejection");
    }
}
