use serde::Deserialize;

use coffeeshop_drinks::{DrinkPatch, NewDrink, Recipe};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

/// Body of POST /drinks and PATCH /drinks/{id}.
///
/// POST needs both fields; PATCH takes either.
#[derive(Debug, Default, Deserialize)]
pub struct DrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<Recipe>,
}

impl DrinkRequest {
    pub fn into_new_drink(self) -> Result<NewDrink, ApiError> {
        let title = self
            .title
            .ok_or_else(|| ApiError::Validation("title is required".to_string()))?;
        let recipe = self
            .recipe
            .ok_or_else(|| ApiError::Validation("recipe is required".to_string()))?;
        Ok(NewDrink::new(title, recipe)?)
    }

    pub fn into_patch(self) -> Result<DrinkPatch, ApiError> {
        Ok(DrinkPatch::new(self.title, self.recipe)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(v: serde_json::Value) -> DrinkRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn create_requires_title_and_recipe() {
        let err = request(serde_json::json!({ "recipe": [] }))
            .into_new_drink()
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "title is required"));

        let err = request(serde_json::json!({ "title": "Water" }))
            .into_new_drink()
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "recipe is required"));
    }

    #[test]
    fn patch_accepts_either_field() {
        let patch = request(serde_json::json!({ "title": "Iced Water" }))
            .into_patch()
            .unwrap();
        assert_eq!(patch.title(), Some("Iced Water"));
        assert!(patch.recipe().is_none());
    }

    #[test]
    fn negative_parts_do_not_deserialize() {
        let parsed = serde_json::from_value::<DrinkRequest>(serde_json::json!({
            "title": "Oops",
            "recipe": [{ "name": "milk", "color": "white", "parts": -1 }],
        }));
        assert!(parsed.is_err());
    }
}
