//! Dedicated writer thread serializing all mutations.
//!
//! SQLite allows one writer at a time; funneling every write through a single
//! actor avoids busy-timeout churn under concurrent requests. Each job runs
//! inside an immediate transaction, so a job either commits fully or leaves
//! the database untouched.

use diesel::sqlite::SqliteConnection;
use tokio::sync::{mpsc, oneshot};

use moneta_core::{DatabaseError, Error, Result};

use super::DbPool;
use crate::errors::StorageError;

type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) + Send>;

/// Handle for submitting write jobs to the writer thread.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<WriteJob>,
}

/// Spawn the writer thread for a pool.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<WriteJob>();

    std::thread::Builder::new()
        .name("moneta-db-writer".to_string())
        .spawn(move || {
            while let Some(job) = rx.blocking_recv() {
                match pool.get() {
                    Ok(mut conn) => job(&mut conn),
                    Err(e) => {
                        // Dropping the job closes its result channel; the
                        // caller sees a writer error.
                        log::error!("[DB] Writer could not check out a connection: {}", e);
                    }
                }
            }
        })
        .expect("failed to spawn database writer thread");

    WriteHandle { tx }
}

enum TxError {
    App(Error),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Diesel(err)
    }
}

impl WriteHandle {
    /// Run a write job on the writer thread, wrapped in a transaction.
    pub async fn exec<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel::<Result<T>>();

        self.tx
            .send(Box::new(move |conn: &mut SqliteConnection| {
                let outcome =
                    match conn.immediate_transaction::<T, TxError, _>(|tx| {
                        job(tx).map_err(TxError::App)
                    }) {
                        Ok(value) => Ok(value),
                        Err(TxError::App(err)) => Err(err),
                        Err(TxError::Diesel(err)) => Err(StorageError::from(err).into()),
                    };
                let _ = done_tx.send(outcome);
            }))
            .map_err(|_| {
                Error::Database(DatabaseError::Internal(
                    "Database writer has shut down".to_string(),
                ))
            })?;

        done_rx.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Database writer dropped the job".to_string(),
            ))
        })?
    }
}
