//! Local replica tables fed by the Zenith sync job.

mod model;
mod repository;

pub use model::{CategoryDB, PaymentMethodDB, ReminderDB, TransactionDB};
pub use repository::ReplicaRepository;
