use diesel::{
    Connection, PgConnection,
    r2d2::{self, ConnectionManager},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::env;

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Debug)]
pub enum DatabaseError {
    ConnectionError(String),
    PoolError(String),
    ConfigurationError(String),
}

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            DatabaseError::PoolError(msg) => write!(f, "Pool error: {}", msg),
            DatabaseError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DatabaseError {}

pub fn database_url() -> Result<String, DatabaseError> {
    env::var("DATABASE_URL")
        .map_err(|_| DatabaseError::ConfigurationError("DATABASE_URL not set".to_string()))
}

pub fn create_connection_pool() -> Result<DbPool, DatabaseError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url()?);

    // Connections are established lazily so that a database still starting
    // up does not abort worker startup; claim errors before it is ready are
    // absorbed by the worker's quiet retry path.
    Ok(r2d2::Pool::builder().max_size(10).build_unchecked(manager))
}

pub fn get_connection_from_pool(pool: &DbPool) -> Result<DbConnection, DatabaseError> {
    pool.get()
        .map_err(|e| DatabaseError::PoolError(e.to_string()))
}

pub fn run_migrations() -> Result<(), DatabaseError> {
    let mut conn = PgConnection::establish(&database_url()?)
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;
    Ok(())
}
