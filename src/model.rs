use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Slot value used when a saved pipe no longer matches the selection.
pub const UNKNOWN_INGREDIENT: &str = "Unknown";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Ingredient {
    #[serde(rename = "ING_ID", deserialize_with = "lenient_id")]
    pub id: u32,
    #[serde(rename = "ING_Name")]
    pub name: String,
    #[serde(rename = "ING_Type")]
    pub kind: String, // "Liquid", "Syrup", ...
    #[serde(rename = "ING_IMG", default)]
    pub image: String, // data: URL
}

/// Reference to an ingredient from inside a recipe.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IngredientRef {
    #[serde(rename = "ING_ID", deserialize_with = "lenient_id")]
    pub id: u32,
    #[serde(rename = "ING_Name")]
    pub name: String,
}

impl From<&Ingredient> for IngredientRef {
    fn from(ingredient: &Ingredient) -> Self {
        Self { id: ingredient.id, name: ingredient.name.clone() }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Recipe {
    #[serde(rename = "PID", deserialize_with = "lenient_id")]
    pub id: u32,
    #[serde(rename = "PName")]
    pub name: String,
    #[serde(rename = "PImage", default)]
    pub image: String,
    #[serde(rename = "PCat", default)]
    pub category: String, // "Cocktail" | "Mocktail" | ...
    #[serde(rename = "PDesc", default)]
    pub description: String,
    #[serde(rename = "PHtm", default)]
    pub instructions: String,
    #[serde(rename = "PIng", default)]
    pub ingredients: Vec<IngredientRef>,
}

/// Persisted pipe layout, owned by the backend as `config.json`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConfigDocument {
    #[serde(rename = "numberOfPipes", default)]
    pub pipe_count: u32,
    #[serde(rename = "pipeConfig", default)]
    pub pipe_config: BTreeMap<String, String>, // "Pipe 1" -> "Vodka"
    #[serde(rename = "selectedIngredients", default)]
    pub selected_ingredients: Vec<String>,
}

/// Pipe index (1-based) to ingredient name.
pub type PipeMap = BTreeMap<u32, String>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DispatchRequest {
    #[serde(rename = "productId")]
    pub product_id: u32,
    pub ingredients: PipeMap,
    #[serde(rename = "drinkType")]
    pub drink_type: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SerialPortInfo {
    pub port: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hwid: String,
}

pub fn pipe_label(index: u32) -> String {
    format!("Pipe {}", index)
}

// The catalog files hold ids both as numbers and as numeric strings.
fn lenient_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u32),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id {:?}", s))),
    }
}
