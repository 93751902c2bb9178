use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;

use super::{
    config::Config,
    database::init_database,
    error::AppError,
    upstream::{HttpBackend, IngestionBackend},
};

pub struct State {
    pub config: Config,
    pub pool: SqlitePool,
    pub backend: Arc<dyn IngestionBackend>,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, AppError> {
        let config = Config::load()?;

        let pool = init_database(&config.database_url, config.database_max_connections).await?;

        let backend = HttpBackend::new(config.ingestion_url.clone());
        info!("Ingestion backend at {}", backend.url());

        Ok(Self::from_parts(config, pool, Arc::new(backend)))
    }

    pub fn from_parts(config: Config, pool: SqlitePool, backend: Arc<dyn IngestionBackend>) -> Arc<Self> {
        Arc::new(Self {
            config,
            pool,
            backend,
        })
    }
}
