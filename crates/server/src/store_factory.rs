use std::sync::Arc;

use ebloodbank_store::BloodBankStore;
use tracing::info;

use crate::config::StoreConfig;
use crate::error::ServerError;

/// Create the store backend named in the configuration.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn BloodBankStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => {
            info!("using in-memory store");
            Ok(Arc::new(ebloodbank_store_memory::MemoryStore::new()))
        }
        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = config.url.as_deref().ok_or_else(|| {
                ServerError::Config("store.url is required for the postgres backend".into())
            })?;
            let defaults = ebloodbank_store_postgres::PostgresConfig::default();
            let pg_config = ebloodbank_store_postgres::PostgresConfig {
                url: url.to_owned(),
                pool_size: config.pool_size.unwrap_or(defaults.pool_size),
                schema: config.schema.clone().unwrap_or(defaults.schema),
                table_prefix: config.prefix.clone().unwrap_or(defaults.table_prefix),
            };
            let store = ebloodbank_store_postgres::PostgresStore::new(pg_config)
                .await
                .map_err(|e| ServerError::Config(format!("postgres store: {e}")))?;
            info!("using postgres store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        "postgres" => Err(ServerError::Config(
            "postgres backend requires the 'postgres' feature".into(),
        )),
        other => Err(ServerError::Config(format!(
            "unknown store backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_is_default() {
        let config = StoreConfig::default();
        assert!(create_store(&config).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_backend_is_a_config_error() {
        let config = StoreConfig {
            backend: "sqlite".into(),
            ..StoreConfig::default()
        };
        let err = create_store(&config).await.err().unwrap();
        assert!(matches!(err, ServerError::Config(ref m) if m.contains("sqlite")));
    }

    #[cfg(feature = "postgres")]
    #[tokio::test]
    async fn postgres_requires_url() {
        let config = StoreConfig {
            backend: "postgres".into(),
            ..StoreConfig::default()
        };
        let err = create_store(&config).await.err().unwrap();
        assert!(matches!(err, ServerError::Config(ref m) if m.contains("store.url")));
    }
}
