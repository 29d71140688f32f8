//! SQLite persistence for sync settings and run logs.

mod model;
mod repository;

pub use model::{SyncLogDB, SyncSettingsDB};
pub use repository::{SyncLogRepository, SyncSettingsRepository, SyncSettingsUpdate};
