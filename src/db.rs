//! Connection pool and schema migrations.

use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::config::DatabaseConfig;

pub type DbConnection = SqliteConnection;
pub type DbPool = r2d2::Pool<ConnectionManager<DbConnection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<DbConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Per-connection pragmas. SQLite keeps these per connection, so every pooled
/// connection has to set them on acquire.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    pub busy_timeout: Duration,
}

impl CustomizeConnection<DbConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut DbConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

pub fn create_db_pool(config: &DatabaseConfig) -> Result<DbPool, r2d2::PoolError> {
    let manager = ConnectionManager::<DbConnection>::new(&config.url);
    r2d2::Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }))
        .build(manager)
}

pub fn create_db_pool_with_url(database_url: &str) -> Result<DbPool, r2d2::PoolError> {
    create_db_pool(&DatabaseConfig {
        url: database_url.to_string(),
        max_connections: 5,
        min_connections: 1,
        connection_timeout_secs: 30,
        busy_timeout_ms: 5000,
    })
}

pub type MigrationError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Applies every embedded migration that has not run yet.
pub fn run_migrations(conn: &mut DbConnection) -> Result<(), MigrationError> {
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in &applied {
        info!(version = %version, "Applied migration");
    }
    Ok(())
}

pub fn run_pool_migrations(pool: &DbPool) -> Result<(), MigrationError> {
    let mut conn = pool.get()?;
    run_migrations(&mut conn)
}

#[cfg(test)]
pub(crate) fn test_connection() -> DbConnection {
    use diesel::Connection;

    let mut conn =
        SqliteConnection::establish(":memory:").expect("Failed to open in-memory database");
    conn.batch_execute("PRAGMA foreign_keys = ON;")
        .expect("Failed to enable foreign keys");
    run_migrations(&mut conn).expect("Failed to run migrations");
    conn
}
