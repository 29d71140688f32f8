//! SQLite persistence layer: diesel schema, migrations, the single-writer
//! actor and the repositories behind the core store traits.

pub mod db;
pub mod errors;
pub mod replica;
pub mod schema;
pub mod sync;

pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer};
pub use db::{DbConnection, DbPool, WriteHandle};
pub use errors::StorageError;
