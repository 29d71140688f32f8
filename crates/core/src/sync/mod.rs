//! Zenith sync domain models and the replication orchestrator.

mod model;
mod orchestrator;
mod remote;
mod scheduler;
mod store;

pub use model::*;
pub use orchestrator::*;
pub use remote::*;
pub use scheduler::*;
pub use store::*;

#[cfg(test)]
mod tests;
