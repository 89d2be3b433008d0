use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    IngredientBrowser,
    AddIngredient,
    AddRecipe,
    RecipeCatalog,
    RecipeDetail,
    PipeAssignment,
    Availability,
}

impl Panel {
    /// Panels reachable from the navigation bar, in display order.
    pub const NAV: [Panel; 6] = [
        Panel::Availability,
        Panel::IngredientBrowser,
        Panel::RecipeCatalog,
        Panel::PipeAssignment,
        Panel::AddIngredient,
        Panel::AddRecipe,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Panel::IngredientBrowser => "Ingredients",
            Panel::AddIngredient => "Add Ingredient",
            Panel::AddRecipe => "Add Cocktail",
            Panel::RecipeCatalog => "Cocktails",
            Panel::RecipeDetail => "Cocktail",
            Panel::PipeAssignment => "Pipes",
            Panel::Availability => "Available",
        }
    }
}

/// Exactly one panel is visible at a time. There is no history.
#[derive(Debug)]
pub struct ViewController {
    active: Panel,
    recipe: Option<u32>,
}

impl Default for ViewController {
    fn default() -> Self {
        Self { active: Panel::Availability, recipe: None }
    }
}

impl ViewController {
    pub fn active(&self) -> Panel {
        self.active
    }

    pub fn navigate(&mut self, panel: Panel) {
        if self.active != panel {
            debug!("[VIEW] {:?} -> {:?}", self.active, panel);
        }
        self.active = panel;
    }

    /// Whether a nav control is highlighted. The detail panel lights up the
    /// catalog entry it was opened from.
    pub fn is_nav_active(&self, panel: Panel) -> bool {
        match self.active {
            Panel::RecipeDetail => panel == Panel::RecipeCatalog,
            active => active == panel,
        }
    }

    pub fn back(&mut self) {
        self.navigate(Panel::Availability);
    }

    pub fn open_recipe(&mut self, id: u32) {
        self.recipe = Some(id);
        self.navigate(Panel::RecipeDetail);
    }

    /// Recipe shown in the detail panel; the product id of a dispatch.
    pub fn selected_recipe(&self) -> Option<u32> {
        self.recipe
    }
}
