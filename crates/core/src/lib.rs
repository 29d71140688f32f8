//! Moneta core: domain models and the Zenith replication orchestrator.

pub mod errors;
pub mod sync;

pub use errors::{DatabaseError, Error, Result};
