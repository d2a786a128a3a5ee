//! Drink persistence abstractions.
//!
//! Handlers only see [`DrinkStore`]; the process picks the in-memory or the
//! Postgres implementation at startup.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryDrinkStore;
pub use postgres::PostgresDrinkStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use coffeeshop_core::{DomainError, DrinkId};
use coffeeshop_drinks::{Drink, DrinkPatch, NewDrink};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => StoreError::Validation(msg),
            DomainError::Corrupt(msg) => StoreError::Corrupt(msg),
        }
    }
}

/// Persistent drink records.
///
/// Every mutation is atomic per record; concurrent writers to the same id
/// resolve last-write-wins.
#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// Every stored drink, ordered by id.
    async fn list_all(&self) -> Result<Vec<Drink>, StoreError>;

    /// Lookup by id. Absence is `Ok(None)`, not an error.
    async fn find_by_id(&self, id: DrinkId) -> Result<Option<Drink>, StoreError>;

    /// Assign an id and persist. Fails with `Validation` when the title is taken.
    async fn create(&self, drink: NewDrink) -> Result<Drink, StoreError>;

    /// Apply a partial update. `NotFound` when the id is absent.
    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError>;

    /// Remove permanently. `NotFound` when the id is absent.
    async fn delete(&self, id: DrinkId) -> Result<(), StoreError>;

    /// Drop every drink and start over with the `water` demo drink.
    async fn reset(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> DrinkStore for Arc<S>
where
    S: DrinkStore + ?Sized,
{
    async fn list_all(&self) -> Result<Vec<Drink>, StoreError> {
        (**self).list_all().await
    }

    async fn find_by_id(&self, id: DrinkId) -> Result<Option<Drink>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn create(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        (**self).create(drink).await
    }

    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: DrinkId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn reset(&self) -> Result<(), StoreError> {
        (**self).reset().await
    }
}
