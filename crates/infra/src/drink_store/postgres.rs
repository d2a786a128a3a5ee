//! Postgres-backed drink store.
//!
//! Recipes live in a TEXT column as JSON and are decoded on read. Title
//! uniqueness is enforced by the table's UNIQUE constraint, so a duplicate
//! surfaces as a unique violation rather than a read-then-write race.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use coffeeshop_core::DrinkId;
use coffeeshop_drinks::{Drink, DrinkPatch, NewDrink, Recipe};

use super::{DrinkStore, StoreError};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS drinks (
        id BIGSERIAL PRIMARY KEY,
        title VARCHAR(80) NOT NULL UNIQUE,
        recipe TEXT NOT NULL
    )
"#;

/// Postgres-backed drink store.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool, which is cheap to clone and safe to share.
/// Each operation is a single statement (or one transaction for `reset`).
#[derive(Debug, Clone)]
pub struct PostgresDrinkStore {
    pool: PgPool,
}

impl PostgresDrinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        info!("connected to postgres");
        Ok(Self::new(pool))
    }

    /// Create the `drinks` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Release pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Validation("title is already in use".to_string())
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}

fn drink_from_row(row: &PgRow) -> Result<Drink, StoreError> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let title: String = row.try_get("title").map_err(map_sqlx_error)?;
    let recipe: String = row.try_get("recipe").map_err(map_sqlx_error)?;
    let recipe = Recipe::from_storage_text(&recipe)?;
    Ok(Drink::from_parts(DrinkId::from_i64(id), title, recipe))
}

#[async_trait]
impl DrinkStore for PostgresDrinkStore {
    async fn list_all(&self) -> Result<Vec<Drink>, StoreError> {
        let rows = sqlx::query("SELECT id, title, recipe FROM drinks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(drink_from_row).collect()
    }

    async fn find_by_id(&self, id: DrinkId) -> Result<Option<Drink>, StoreError> {
        let row = sqlx::query("SELECT id, title, recipe FROM drinks WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(drink_from_row).transpose()
    }

    async fn create(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO drinks (title, recipe)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(drink.title())
        .bind(drink.recipe().to_storage_text())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        debug!(id, "drink inserted");
        Ok(drink.into_drink(DrinkId::from_i64(id)))
    }

    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE drinks
            SET title = COALESCE($2, title),
                recipe = COALESCE($3, recipe)
            WHERE id = $1
            RETURNING id, title, recipe
            "#,
        )
        .bind(id.as_i64())
        .bind(patch.title())
        .bind(patch.recipe().map(Recipe::to_storage_text))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => drink_from_row(&row),
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: DrinkId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM drinks WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let water = NewDrink::water();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DROP TABLE IF EXISTS drinks")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query(CREATE_TABLE)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query("INSERT INTO drinks (title, recipe) VALUES ($1, $2)")
            .bind(water.title())
            .bind(water.recipe().to_storage_text())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        info!("drinks table reset");
        Ok(())
    }
}
