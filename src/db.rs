//! Database module
//!
//! Connection pool setup and embedded schema migrations.

use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::{Config, ServiceKind};

/// Timeout for establishing the initial connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Open the connection pool for a service
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(&config.database_url)
        .await?;

    verify_connection(&pool).await?;
    Ok(pool)
}

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the service's migrations.
///
/// Both services may share one database, so versions recorded by the other
/// service's migrator are ignored.
pub async fn migrate(pool: &PgPool, service: ServiceKind) -> Result<(), sqlx::migrate::MigrateError> {
    let mut migrator: Migrator = match service {
        ServiceKind::Music => sqlx::migrate!("./migrations/music"),
        ServiceKind::User => sqlx::migrate!("./migrations/user"),
    };
    migrator.set_ignore_missing(true);
    migrator.run(pool).await?;

    tracing::info!(service = ?service, "Database schema is up to date");
    Ok(())
}

