//! Connection pool, migrations and the single-writer actor.

pub mod write_actor;

use std::path::Path;
use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use moneta_core::{DatabaseError, Error, Result};

use crate::errors::StorageError;

pub use write_actor::{spawn_writer, WriteHandle};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const DB_FILE_NAME: &str = "moneta.db";

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Ensure the data directory exists and return the database file path.
pub fn init(app_data_dir: &str) -> Result<String> {
    std::fs::create_dir_all(app_data_dir).map_err(|e| {
        Error::Database(DatabaseError::Internal(format!(
            "Failed to create data directory '{}': {}",
            app_data_dir, e
        )))
    })?;
    let db_path = Path::new(app_data_dir).join(DB_FILE_NAME);
    Ok(db_path.to_string_lossy().to_string())
}

/// Run embedded migrations against the database file.
pub fn run_migrations(db_path: &str) -> Result<()> {
    let mut conn = SqliteConnection::establish(db_path).map_err(StorageError::from)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    Ok(())
}

/// Create the shared connection pool with WAL and foreign keys enabled.
pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(8)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::Internal(e.to_string())))?;
    Ok(Arc::new(pool))
}

/// Check out a read connection from the pool.
pub fn get_connection(pool: &Arc<DbPool>) -> Result<DbConnection> {
    pool.get()
        .map_err(|e| Error::Database(DatabaseError::PoolExhausted(e.to_string())))
}

#[derive(Debug)]
struct ConnectionOptions;

impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionOptions
{
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA foreign_keys = ON; \
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}
