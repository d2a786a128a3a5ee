use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use coffeeshop_core::DrinkId;
use coffeeshop_drinks::{Drink, DrinkPatch, NewDrink};

use super::{DrinkStore, StoreError};

#[derive(Debug)]
struct State {
    drinks: BTreeMap<DrinkId, Drink>,
    next_id: i64,
}

impl State {
    fn title_taken(&self, title: &str, except: Option<DrinkId>) -> bool {
        self.drinks
            .values()
            .any(|d| d.title() == title && Some(d.id_typed()) != except)
    }

    fn insert(&mut self, drink: NewDrink) -> Drink {
        let id = DrinkId::from_i64(self.next_id);
        self.next_id += 1;
        let drink = drink.into_drink(id);
        self.drinks.insert(id, drink.clone());
        drink
    }
}

/// In-memory drink store for tests/dev.
///
/// Ids come from a counter that never goes backwards, so a deleted id is
/// never handed out again (until `reset`).
#[derive(Debug)]
pub struct InMemoryDrinkStore {
    inner: RwLock<State>,
}

impl InMemoryDrinkStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(State {
                drinks: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryDrinkStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl DrinkStore for InMemoryDrinkStore {
    async fn list_all(&self) -> Result<Vec<Drink>, StoreError> {
        let state = self.inner.read().map_err(poisoned)?;
        Ok(state.drinks.values().cloned().collect())
    }

    async fn find_by_id(&self, id: DrinkId) -> Result<Option<Drink>, StoreError> {
        let state = self.inner.read().map_err(poisoned)?;
        Ok(state.drinks.get(&id).cloned())
    }

    async fn create(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        let mut state = self.inner.write().map_err(poisoned)?;
        if state.title_taken(drink.title(), None) {
            return Err(StoreError::Validation(format!(
                "title '{}' is already in use",
                drink.title()
            )));
        }
        Ok(state.insert(drink))
    }

    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError> {
        let mut state = self.inner.write().map_err(poisoned)?;
        if !state.drinks.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if let Some(title) = patch.title() {
            if state.title_taken(title, Some(id)) {
                return Err(StoreError::Validation(format!(
                    "title '{title}' is already in use"
                )));
            }
        }

        let drink = state.drinks.get_mut(&id).ok_or(StoreError::NotFound)?;
        drink.apply(&patch);
        Ok(drink.clone())
    }

    async fn delete(&self, id: DrinkId) -> Result<(), StoreError> {
        let mut state = self.inner.write().map_err(poisoned)?;
        state.drinks.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut state = self.inner.write().map_err(poisoned)?;
        state.drinks.clear();
        state.next_id = 1;
        state.insert(NewDrink::water());
        Ok(())
    }
}
