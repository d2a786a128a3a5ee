use coffeeshop_core::{DomainError, DomainResult, DrinkId};

use crate::recipe::{Ingredient, Recipe};
use crate::view::{DrinkLongView, DrinkShortView};

/// Longest title the `drinks.title` column accepts.
pub const MAX_TITLE_LEN: usize = 80;

/// A stored drink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    id: DrinkId,
    title: String,
    recipe: Recipe,
}

impl Drink {
    /// Rebuild a drink from storage. The caller owns the id assignment.
    pub fn from_parts(id: DrinkId, title: impl Into<String>, recipe: Recipe) -> Self {
        Self {
            id,
            title: title.into(),
            recipe,
        }
    }

    pub fn id_typed(&self) -> DrinkId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// Apply a validated patch. Each present field is replaced independently.
    pub fn apply(&mut self, patch: &DrinkPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(recipe) = &patch.recipe {
            self.recipe = recipe.clone();
        }
    }

    /// Public projection: ingredient names withheld.
    pub fn short(&self) -> DrinkShortView {
        DrinkShortView::from(self)
    }

    /// Full projection.
    pub fn long(&self) -> DrinkLongView {
        DrinkLongView::from(self)
    }
}

/// Input for creating a drink (no id yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    title: String,
    recipe: Recipe,
}

impl NewDrink {
    pub fn new(title: impl Into<String>, recipe: Recipe) -> DomainResult<Self> {
        let title = validate_title(title.into())?;
        recipe.validate()?;
        Ok(Self { title, recipe })
    }

    /// The drink every fresh database starts with.
    pub fn water() -> Self {
        Self {
            title: "water".to_string(),
            recipe: Recipe::new(vec![Ingredient::new("water", "blue", 1)]),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn into_drink(self, id: DrinkId) -> Drink {
        Drink::from_parts(id, self.title, self.recipe)
    }
}

/// Partial update of a drink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrinkPatch {
    title: Option<String>,
    recipe: Option<Recipe>,
}

impl DrinkPatch {
    pub fn new(title: Option<String>, recipe: Option<Recipe>) -> DomainResult<Self> {
        let title = title.map(validate_title).transpose()?;
        if let Some(recipe) = &recipe {
            recipe.validate()?;
        }
        Ok(Self { title, recipe })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        self.recipe.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.recipe.is_none()
    }
}

fn validate_title(title: String) -> DomainResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}
