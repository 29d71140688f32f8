//! Shared application state wired at startup.

use std::sync::Arc;

use tokio::sync::Mutex;

use moneta_core::sync::{SyncConfig, SyncOrchestrator, SyncRunResult, SyncTrigger, ZenithSource};
use moneta_storage_sqlite::replica::ReplicaRepository;
use moneta_storage_sqlite::sync::{SyncLogRepository, SyncSettingsRepository};
use moneta_storage_sqlite::{create_pool, init, run_migrations, spawn_writer};
use moneta_zenith_client::ZenithClient;

use crate::config::ServerConfig;

pub struct AppState {
    pub config: ServerConfig,
    pub settings: Arc<SyncSettingsRepository>,
    pub logs: Arc<SyncLogRepository>,
    orchestrator: SyncOrchestrator,
    /// Held for the duration of a sync run; `try_lock` failure means a run is
    /// already in flight.
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn build(config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        let db_path = init(&config.data_dir)?;
        run_migrations(&db_path)?;
        let pool = create_pool(&db_path)?;
        let writer = spawn_writer(pool.as_ref().clone());

        let settings = Arc::new(SyncSettingsRepository::new(pool.clone(), writer.clone()));
        let logs = Arc::new(SyncLogRepository::new(pool.clone(), writer.clone()));
        let replica = Arc::new(ReplicaRepository::new(pool, writer));

        let orchestrator = SyncOrchestrator::new(
            settings.clone(),
            logs.clone(),
            replica,
            SyncConfig::default(),
        );

        Ok(Arc::new(Self {
            config,
            settings,
            logs,
            orchestrator,
            run_lock: Mutex::new(()),
        }))
    }

    /// Build the remote source from the settings row (URL override) and the
    /// environment. `None` when either the URL or the service token is
    /// missing; the orchestrator then records a failed run.
    fn zenith_source(&self) -> moneta_core::Result<Option<ZenithClient>> {
        use moneta_core::sync::SyncSettingsStore;

        let stored_url = self.settings.get()?.zenith_url;
        let url = stored_url.or_else(|| self.config.zenith_api_url.clone());
        let token = self.config.zenith_service_token.clone();

        match (url, token) {
            (Some(url), Some(token)) => Ok(Some(ZenithClient::new(&url, &token)?)),
            _ => Ok(None),
        }
    }

    /// Run one sync pass. Callers must hold `run_lock`.
    pub async fn run_sync(&self, trigger: SyncTrigger) -> moneta_core::Result<SyncRunResult> {
        let source = self.zenith_source()?;
        self.orchestrator
            .run(source.as_ref().map(|c| c as &dyn ZenithSource), trigger)
            .await
    }
}
