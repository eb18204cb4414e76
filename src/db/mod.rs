//! Application state and the PostgreSQL-backed template store.
//!
//! - `template` - template and font record queries

mod template;

pub use template::PgTemplateStore;

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, RenderSettings};
use crate::template::TemplateStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TemplateStore + Send + Sync>,
    pub render: RenderSettings,
}

impl AppState {
    pub async fn new_with_config(config: AppConfig) -> anyhow::Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(900))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&config.database_url)
            .await?;

        if config.run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
            log::info!("Database migrations applied");
        }

        Ok(Self::new_with_pool(pool, config.render))
    }

    pub fn new_with_pool(pool: PgPool, render: RenderSettings) -> Self {
        Self::new_with_store(Arc::new(PgTemplateStore::new(pool)), render)
    }

    pub fn new_with_store(
        store: Arc<dyn TemplateStore + Send + Sync>,
        render: RenderSettings,
    ) -> Self {
        AppState { store, render }
    }
}
