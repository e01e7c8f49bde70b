//! Storage wiring: pick and connect the session pool backing the service.

use std::sync::Arc;

use companies_infra::{MemoryPool, PostgresPool, SessionPool, StoreError};

use crate::config::Config;

/// Connect the pool described by `config`.
///
/// With `DATABASE_URL` set this dials Postgres and makes sure the documents
/// table exists; failure here is fatal for the process. Without it the
/// service runs on the in-memory store.
pub async fn connect(config: &Config) -> Result<Arc<dyn SessionPool>, StoreError> {
    match &config.database_url {
        Some(url) => {
            let pool = PostgresPool::connect(url, config.database_max_connections).await?;
            pool.ensure_schema().await?;
            tracing::info!(
                max_connections = config.database_max_connections,
                "connected to postgres document store"
            );
            Ok(Arc::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory document store");
            Ok(Arc::new(MemoryPool::new()))
        }
    }
}
