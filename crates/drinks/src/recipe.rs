use serde::{Deserialize, Serialize};

use coffeeshop_core::{DomainError, DomainResult};

/// One line of a recipe.
///
/// `parts` is a relative quantity; `color` is only used when the client
/// renders the drink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, color: impl Into<String>, parts: u32) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            parts,
        }
    }
}

/// Ordered list of ingredients.
///
/// Persisted as JSON text (`[{"name":..,"color":..,"parts":..}]`) and decoded on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe(Vec<Ingredient>);

impl Recipe {
    pub fn new(ingredients: Vec<Ingredient>) -> Self {
        Self(ingredients)
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every ingredient must contribute at least one part.
    pub fn validate(&self) -> DomainResult<()> {
        match self.0.iter().find(|i| i.parts == 0) {
            Some(bad) => Err(DomainError::validation(format!(
                "ingredient '{}' must have at least one part",
                bad.name
            ))),
            None => Ok(()),
        }
    }

    /// Encode into the text form kept in the `recipe` column.
    pub fn to_storage_text(&self) -> String {
        // A Vec of plain string/integer structs cannot fail to serialize.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Decode the `recipe` column back into a recipe.
    pub fn from_storage_text(text: &str) -> DomainResult<Self> {
        serde_json::from_str(text).map_err(|e| DomainError::corrupt(format!("recipe: {e}")))
    }
}

impl From<Vec<Ingredient>> for Recipe {
    fn from(value: Vec<Ingredient>) -> Self {
        Self(value)
    }
}

impl<'a> IntoIterator for &'a Recipe {
    type Item = &'a Ingredient;
    type IntoIter = core::slice::Iter<'a, Ingredient>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
