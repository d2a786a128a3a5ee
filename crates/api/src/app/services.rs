//! Store wiring: which `DrinkStore` backs the process and how it is torn down.

use std::sync::Arc;

use coffeeshop_infra::{DrinkStore, InMemoryDrinkStore, PostgresDrinkStore, StoreError};

use crate::config::StoreConfig;

/// Long-lived services shared by every handler.
///
/// Built once at startup and handed to the router; there is no global
/// store handle.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn DrinkStore>,
    postgres: Option<PostgresDrinkStore>,
}

impl AppServices {
    /// Wrap any store (tests use this to inject doubles).
    pub fn new(store: Arc<dyn DrinkStore>) -> Self {
        Self {
            store,
            postgres: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryDrinkStore::new()))
    }

    pub fn postgres(store: PostgresDrinkStore) -> Self {
        Self {
            store: Arc::new(store.clone()),
            postgres: Some(store),
        }
    }

    pub fn store(&self) -> &dyn DrinkStore {
        self.store.as_ref()
    }

    /// Release backend resources (the Postgres pool); a no-op in memory.
    pub async fn shutdown(&self) {
        if let Some(pg) = &self.postgres {
            pg.close().await;
            tracing::info!("postgres pool closed");
        }
    }
}

/// Connect the configured backend, create its schema and optionally reset it.
pub async fn build_services(config: &StoreConfig) -> Result<AppServices, StoreError> {
    let services = match &config.database_url {
        Some(url) => {
            let store = PostgresDrinkStore::connect(url).await?;
            store.ensure_schema().await?;
            AppServices::postgres(store)
        }
        None => {
            tracing::warn!("USE_PERSISTENT_STORES not enabled; drinks are kept in memory");
            AppServices::in_memory()
        }
    };

    if config.reset {
        tracing::warn!("RESET_DATABASE=true: dropping all drinks");
        services.store().reset().await?;
    }

    Ok(services)
}
