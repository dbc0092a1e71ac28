pub mod entities;
pub mod migrator;
pub mod repositories;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::config::PoolConfig;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./voltpark.db?mode=rwc")
    pub url: String,
    pub pool: PoolConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./voltpark.db?mode=rwc".to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
            pool: PoolConfig::default(),
        }
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", config.url);

    let mut opts = ConnectOptions::new(config.url.clone());
    opts.max_connections(config.pool.max_connections)
        .min_connections(config.pool.min_connections)
        .connect_timeout(Duration::from_secs(config.pool.connect_timeout_secs))
        .sqlx_logging(false);

    let db = Database::connect(opts).await?;
    info!("Database connected successfully");
    Ok(db)
}
