// A machine has N output pipes (1..=100). Generating a layout snapshots the
// current selection as every slot's option list. A slot then holds one of
// those options, nothing, or `Unknown` after a reload whose saved value no
// longer fits.

use crate::backend::BackendError;
use crate::model::{pipe_label, ConfigDocument, DispatchRequest, PipeMap, UNKNOWN_INGREDIENT};
use crate::selection::SelectionSet;
use log::{debug, info, warn};
use std::collections::BTreeMap;

pub const MIN_PIPES: u32 = 1;
pub const MAX_PIPES: u32 = 100;

/// Counts offered as one-click presets.
pub const PRESET_PIPE_COUNTS: [u32; 5] = [4, 6, 8, 10, 12];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipeError {
    #[error("Please enter a valid number between 1 and 100.")]
    OutOfRange(u32),
    #[error("Pipe {0} does not exist")]
    NoSuchPipe(u32),
    #[error("{name} is not an option for pipe {pipe}")]
    NotAnOption { pipe: u32, name: String },
    #[error("Saved configuration has {0} pipes, more than the supported 100")]
    InvalidDocument(u32),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("No cocktail selected")]
    NoRecipe,
    #[error("No pipes have an ingredient assigned")]
    NothingAssigned,
    // The backend's reply text is shown to the user as is.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipeValue {
    #[default]
    Empty,
    Ingredient(String),
    Unknown,
}

impl PipeValue {
    pub fn as_str(&self) -> &str {
        match self {
            PipeValue::Empty => "",
            PipeValue::Ingredient(name) => name,
            PipeValue::Unknown => UNKNOWN_INGREDIENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipeSlot {
    pub options: Vec<String>,
    pub value: PipeValue,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipeAssignment {
    slots: Vec<PipeSlot>,
}

impl PipeAssignment {
    /// Replace the whole layout with `count` empty slots.
    pub fn generate(&mut self, count: u32, selection: &SelectionSet) -> Result<(), PipeError> {
        if !(MIN_PIPES..=MAX_PIPES).contains(&count) {
            warn!("[PIPES] Rejected pipe count {}", count);
            return Err(PipeError::OutOfRange(count));
        }
        let options: Vec<String> = selection.to_vec();
        self.slots = (0..count)
            .map(|_| PipeSlot { options: options.clone(), value: PipeValue::Empty })
            .collect();
        info!("[PIPES] Generated {} pipes with {} options each", count, options.len());
        Ok(())
    }

    /// Set (`Some`) or clear (`None`) the ingredient of one 1-based pipe.
    pub fn assign(&mut self, pipe: u32, ingredient: Option<&str>) -> Result<(), PipeError> {
        let slot = pipe
            .checked_sub(1)
            .and_then(|idx| self.slots.get_mut(idx as usize))
            .ok_or(PipeError::NoSuchPipe(pipe))?;

        slot.value = match ingredient {
            None => PipeValue::Empty,
            Some(name) if slot.options.iter().any(|o| o == name) => {
                PipeValue::Ingredient(name.to_string())
            }
            Some(name) => {
                return Err(PipeError::NotAnOption { pipe, name: name.to_string() });
            }
        };
        debug!("[PIPES] Pipe {} = {:?}", pipe, slot.value.as_str());
        Ok(())
    }

    pub fn count(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, pipe: u32) -> Option<&PipeSlot> {
        pipe.checked_sub(1).and_then(|idx| self.slots.get(idx as usize))
    }

    /// Slots paired with their 1-based pipe number.
    pub fn slots(&self) -> impl Iterator<Item = (u32, &PipeSlot)> {
        self.slots.iter().enumerate().map(|(i, s)| (i as u32 + 1, s))
    }

    /// Pipes that carry a real ingredient, for dispatch.
    pub fn dispatch_map(&self) -> PipeMap {
        self.slots()
            .filter_map(|(pipe, slot)| match &slot.value {
                PipeValue::Ingredient(name) => Some((pipe, name.clone())),
                _ => None,
            })
            .collect()
    }

    /// Build the dispatch payload for the recipe on display.
    pub fn dispatch_request(
        &self,
        product_id: Option<u32>,
        drink_type: &str,
    ) -> Result<DispatchRequest, DispatchError> {
        let product_id = product_id.ok_or(DispatchError::NoRecipe)?;
        let ingredients = self.dispatch_map();
        if ingredients.is_empty() {
            return Err(DispatchError::NothingAssigned);
        }
        Ok(DispatchRequest { product_id, ingredients, drink_type: drink_type.to_string() })
    }

    pub fn serialize(&self, selection: &SelectionSet) -> ConfigDocument {
        let pipe_config: BTreeMap<String, String> = self
            .slots()
            .map(|(pipe, slot)| (pipe_label(pipe), slot.value.as_str().to_string()))
            .collect();
        ConfigDocument {
            pipe_count: self.count(),
            pipe_config,
            selected_ingredients: selection.to_vec(),
        }
    }

    /// Rebuild selection and layout from a saved document.
    pub fn load(doc: &ConfigDocument) -> Result<(SelectionSet, PipeAssignment), PipeError> {
        if doc.pipe_count > MAX_PIPES {
            return Err(PipeError::InvalidDocument(doc.pipe_count));
        }
        let selection = SelectionSet::from_saved(doc.selected_ingredients.iter().cloned());
        let mut assignment = PipeAssignment::default();
        if doc.pipe_count == 0 {
            info!("[PIPES] Loaded configuration without pipes");
            return Ok((selection, assignment));
        }
        assignment.generate(doc.pipe_count, &selection)?;

        let mut unknown = 0;
        for (idx, slot) in assignment.slots.iter_mut().enumerate() {
            let saved = doc.pipe_config.get(&pipe_label(idx as u32 + 1));
            slot.value = match saved {
                Some(name) if slot.options.iter().any(|o| o == name) => {
                    PipeValue::Ingredient(name.clone())
                }
                _ => {
                    unknown += 1;
                    PipeValue::Unknown
                }
            };
        }
        info!(
            "[PIPES] Loaded {} pipes ({} unknown) and {} selected ingredients",
            assignment.count(),
            unknown,
            selection.count()
        );
        Ok((selection, assignment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(names: &[&str]) -> SelectionSet {
        SelectionSet::from_saved(names.iter().map(|n| n.to_string()))
    }

    #[test]
    fn test_generate_every_valid_count() {
        let sel = selection(&["Vodka", "Lime"]);
        for n in MIN_PIPES..=MAX_PIPES {
            let mut pipes = PipeAssignment::default();
            pipes.generate(n, &sel).unwrap();
            assert_eq!(pipes.count(), n);
            assert!(pipes.slots().all(|(_, s)| s.options == vec!["Vodka", "Lime"]
                && s.value == PipeValue::Empty));
        }
    }

    #[test]
    fn test_generate_out_of_range_keeps_prior_layout() {
        let sel = selection(&["Vodka"]);
        let mut pipes = PipeAssignment::default();
        pipes.generate(3, &sel).unwrap();
        pipes.assign(2, Some("Vodka")).unwrap();
        let before = pipes.clone();

        for bad in [0, 101, 1000] {
            assert_eq!(pipes.generate(bad, &sel), Err(PipeError::OutOfRange(bad)));
            assert_eq!(pipes, before, "Rejected generate must not touch state");
        }
    }

    #[test]
    fn test_generate_discards_previous_assignment() {
        let sel = selection(&["Vodka"]);
        let mut pipes = PipeAssignment::default();
        pipes.generate(2, &sel).unwrap();
        pipes.assign(1, Some("Vodka")).unwrap();
        pipes.generate(2, &sel).unwrap();
        assert!(pipes.dispatch_map().is_empty());
    }

    #[test]
    fn test_options_are_a_snapshot() {
        let mut sel = selection(&["Vodka"]);
        let mut pipes = PipeAssignment::default();
        pipes.generate(1, &sel).unwrap();
        sel.toggle("Lime".to_string()).unwrap();

        assert_eq!(pipes.slot(1).unwrap().options, vec!["Vodka"]);
        assert!(matches!(pipes.assign(1, Some("Lime")), Err(PipeError::NotAnOption { .. })));
    }

    #[test]
    fn test_assign_and_clear() {
        let sel = selection(&["Vodka", "Lime"]);
        let mut pipes = PipeAssignment::default();
        pipes.generate(2, &sel).unwrap();

        pipes.assign(1, Some("Vodka")).unwrap();
        pipes.assign(2, Some("Vodka")).unwrap(); // duplicates allowed
        assert_eq!(pipes.dispatch_map().len(), 2);

        pipes.assign(2, None).unwrap();
        assert_eq!(pipes.slot(2).unwrap().value, PipeValue::Empty);
        assert_eq!(pipes.assign(0, None), Err(PipeError::NoSuchPipe(0)));
        assert_eq!(pipes.assign(3, None), Err(PipeError::NoSuchPipe(3)));
    }

    #[test]
    fn test_dispatch_map_skips_empty_and_unknown() {
        let sel = selection(&["Vodka", "Lime"]);
        let mut pipes = PipeAssignment::default();
        pipes.generate(3, &sel).unwrap();
        pipes.assign(1, Some("Vodka")).unwrap();
        pipes.assign(3, Some("Lime")).unwrap();

        let map = pipes.dispatch_map();
        assert_eq!(map.get(&1).map(String::as_str), Some("Vodka"));
        assert_eq!(map.get(&2), None);
        assert_eq!(map.get(&3).map(String::as_str), Some("Lime"));
    }

    #[test]
    fn test_serialize_labels_pipes() {
        let sel = selection(&["Vodka", "Lime"]);
        let mut pipes = PipeAssignment::default();
        pipes.generate(2, &sel).unwrap();
        pipes.assign(1, Some("Lime")).unwrap();

        let doc = pipes.serialize(&sel);
        assert_eq!(doc.pipe_count, 2);
        assert_eq!(doc.pipe_config["Pipe 1"], "Lime");
        assert_eq!(doc.pipe_config["Pipe 2"], "");
        assert_eq!(doc.selected_ingredients, vec!["Vodka", "Lime"]);
    }

    #[test]
    fn test_serialize_then_load_round_trip() {
        let sel = selection(&["Vodka", "Lime"]);
        let mut pipes = PipeAssignment::default();
        pipes.generate(3, &sel).unwrap();
        pipes.assign(1, Some("Vodka")).unwrap();
        pipes.assign(2, Some("Lime")).unwrap();

        let doc = pipes.serialize(&sel);
        let (loaded_sel, loaded) = PipeAssignment::load(&doc).unwrap();
        assert_eq!(loaded_sel, sel);
        assert_eq!(loaded.count(), 3);
        assert_eq!(loaded.slot(1).unwrap().value, PipeValue::Ingredient("Vodka".into()));
        assert_eq!(loaded.slot(2).unwrap().value, PipeValue::Ingredient("Lime".into()));
        // An unassigned pipe comes back as Unknown.
        assert_eq!(loaded.slot(3).unwrap().value, PipeValue::Unknown);
    }

    #[test]
    fn test_load_marks_values_outside_selection_unknown() {
        let mut doc = ConfigDocument {
            pipe_count: 2,
            selected_ingredients: vec!["Vodka".into()],
            ..Default::default()
        };
        doc.pipe_config.insert("Pipe 1".into(), "Vodka".into());
        doc.pipe_config.insert("Pipe 2".into(), "Rum".into());

        let (_, pipes) = PipeAssignment::load(&doc).unwrap();
        assert_eq!(pipes.slot(1).unwrap().value, PipeValue::Ingredient("Vodka".into()));
        assert_eq!(pipes.slot(2).unwrap().value, PipeValue::Unknown);
        assert_eq!(pipes.slot(2).unwrap().value.as_str(), "Unknown");
    }

    #[test]
    fn test_load_zero_and_oversized_counts() {
        let empty = ConfigDocument::default();
        let (sel, pipes) = PipeAssignment::load(&empty).unwrap();
        assert!(sel.is_empty());
        assert!(pipes.is_empty());

        let big = ConfigDocument { pipe_count: 101, ..Default::default() };
        assert_eq!(PipeAssignment::load(&big), Err(PipeError::InvalidDocument(101)));
    }

    #[test]
    fn test_dispatch_payload_shape() {
        let sel = selection(&["Vodka", "Lime"]);
        let mut pipes = PipeAssignment::default();
        pipes.generate(3, &sel).unwrap();
        pipes.assign(1, Some("Vodka")).unwrap();
        pipes.assign(2, Some("Lime")).unwrap();

        let request = pipes.dispatch_request(Some(7), "Cocktail").unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "productId": 7,
                "ingredients": {"1": "Vodka", "2": "Lime"},
                "drinkType": "Cocktail"
            })
        );
    }

    #[test]
    fn test_dispatch_needs_recipe_and_assignment() {
        let sel = selection(&["Vodka"]);
        let mut pipes = PipeAssignment::default();
        pipes.generate(1, &sel).unwrap();
        assert!(matches!(pipes.dispatch_request(Some(1), "Shot"), Err(DispatchError::NothingAssigned)));
        pipes.assign(1, Some("Vodka")).unwrap();
        assert!(matches!(pipes.dispatch_request(None, "Shot"), Err(DispatchError::NoRecipe)));
    }

    #[test]
    fn test_backend_rejection_shows_reply_text_only() {
        let err = DispatchError::from(BackendError::Rejected { status: 200, body: "BUSY".into() });
        assert_eq!(err.to_string(), "BUSY");
    }
}
