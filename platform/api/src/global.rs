use std::sync::Arc;

use common::context::Context;
use common::global::{GlobalConfig, GlobalConfigProvider, GlobalCtx};

use crate::config::{ApiConfig, AppConfig, DatabaseBackend, DatabaseConfig, JwtConfig, PassConfig};
use crate::store::{MemoryStore, PassStore, PgStore, StoreError};

pub trait GlobalStore {
    fn store(&self) -> &dyn PassStore;
}

pub trait ApiGlobal:
    GlobalCtx
    + GlobalConfigProvider<ApiConfig>
    + GlobalConfigProvider<JwtConfig>
    + GlobalConfigProvider<PassConfig>
    + GlobalConfig
    + GlobalStore
    + Send
    + Sync
    + 'static
{
}

impl<T> ApiGlobal for T where
    T: GlobalCtx
        + GlobalConfigProvider<ApiConfig>
        + GlobalConfigProvider<JwtConfig>
        + GlobalConfigProvider<PassConfig>
        + GlobalConfig
        + GlobalStore
        + Send
        + Sync
        + 'static
{
}

pub struct GlobalState {
    pub config: AppConfig,
    pub ctx: Context,
    pub store: Arc<dyn PassStore>,
}

impl GlobalState {
    pub fn new(config: AppConfig, store: Arc<dyn PassStore>, ctx: Context) -> Self {
        Self { config, ctx, store }
    }
}

impl GlobalCtx for GlobalState {
    fn ctx(&self) -> &Context {
        &self.ctx
    }
}

impl GlobalConfigProvider<ApiConfig> for GlobalState {
    fn provide_config(&self) -> &ApiConfig {
        &self.config.api
    }
}

impl GlobalConfigProvider<JwtConfig> for GlobalState {
    fn provide_config(&self) -> &JwtConfig {
        &self.config.jwt
    }
}

impl GlobalConfigProvider<PassConfig> for GlobalState {
    fn provide_config(&self) -> &PassConfig {
        &self.config.pass
    }
}

impl GlobalConfig for GlobalState {}

impl GlobalStore for GlobalState {
    fn store(&self) -> &dyn PassStore {
        self.store.as_ref()
    }
}

pub async fn setup_store(config: &DatabaseConfig) -> Result<Arc<dyn PassStore>, StoreError> {
    match config.backend {
        DatabaseBackend::Memory => {
            tracing::warn!("using the in memory store, passes will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseBackend::Postgres => {
            let store = PgStore::connect(config).await?;

            if config.run_migrations {
                store.migrate().await?;
                tracing::info!("database migrations applied");
            }

            Ok(Arc::new(store))
        }
    }
}
