//! Drinks domain module.
//!
//! This crate contains the drink model and its two public projections,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod drink;
pub mod recipe;
pub mod view;

pub use drink::{Drink, DrinkPatch, NewDrink, MAX_TITLE_LEN};
pub use recipe::{Ingredient, Recipe};
pub use view::{DrinkLongView, DrinkShortView, IngredientShortView};
