//! Serialization views of a drink.
//!
//! The short view is public and hides ingredient names; the long view is the
//! full record. Both are pure projections of [`Drink`].

use serde::Serialize;

use coffeeshop_core::DrinkId;

use crate::drink::Drink;
use crate::recipe::{Ingredient, Recipe};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientShortView {
    pub color: String,
    pub parts: u32,
}

impl From<&Ingredient> for IngredientShortView {
    fn from(value: &Ingredient) -> Self {
        Self {
            color: value.color.clone(),
            parts: value.parts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinkShortView {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Vec<IngredientShortView>,
}

impl From<&Drink> for DrinkShortView {
    fn from(drink: &Drink) -> Self {
        Self {
            id: drink.id_typed(),
            title: drink.title().to_string(),
            recipe: drink.recipe().into_iter().map(IngredientShortView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinkLongView {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Recipe,
}

impl From<&Drink> for DrinkLongView {
    fn from(drink: &Drink) -> Self {
        Self {
            id: drink.id_typed(),
            title: drink.title().to_string(),
            recipe: drink.recipe().clone(),
        }
    }
}
