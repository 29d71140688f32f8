//! Storage error mapping into the core error type.

use moneta_core::{DatabaseError, Error};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("Query failed: {0}")]
    Diesel(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Connection failed: {0}")]
    Connection(#[from] diesel::result::ConnectionError),

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Diesel(diesel::result::Error::NotFound) => {
                Error::Database(DatabaseError::NotFound("record not found".to_string()))
            }
            StorageError::Diesel(e) => Error::Database(DatabaseError::QueryFailed(e.to_string())),
            StorageError::Pool(e) => Error::Database(DatabaseError::PoolExhausted(e.to_string())),
            StorageError::Connection(e) => Error::Database(DatabaseError::Internal(e.to_string())),
            StorageError::Migration(msg) => Error::Database(DatabaseError::Internal(msg)),
        }
    }
}
