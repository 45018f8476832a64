//! Shared application state.

use crate::config::OracleConfig;
use crate::error::ApiError;
use portico_core::PermissionOracle;
use portico_driver::{DriverConnector, SqlxConnector};
use portico_sqldb::{ConfigStore, SERVICE_TYPE, SqlDbService};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: ConfigStore,
    oracle: OracleConfig,
    connector: Box<dyn DriverConnector>,
    /// Live service instances, keyed by service name.
    services: RwLock<HashMap<String, Arc<SqlDbService>>>,
}

impl AppState {
    pub fn new(store: ConfigStore, oracle: OracleConfig) -> Self {
        Self::with_connector(store, oracle, Box::new(SqlxConnector))
    }

    /// Swap the driver connector; embedding hosts and tests use this.
    pub fn with_connector(
        store: ConfigStore,
        oracle: OracleConfig,
        connector: Box<dyn DriverConnector>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                oracle,
                connector,
                services: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.inner.store
    }

    pub fn oracle_for(&self, service: &str) -> Arc<dyn PermissionOracle> {
        self.inner.oracle.for_service(service)
    }

    pub fn service_allowed(&self, service: &str) -> bool {
        self.inner.oracle.service_allowed(service)
    }

    /// Preload a live service instance (bootstrap and tests).
    pub async fn register(&self, service: Arc<SqlDbService>) {
        self.inner
            .services
            .write()
            .await
            .insert(service.name().to_string(), service);
    }

    /// The live service for `name`, instantiated from stored configuration
    /// on first use.
    pub async fn service(&self, name: &str) -> Result<Arc<SqlDbService>, ApiError> {
        if let Some(service) = self.inner.services.read().await.get(name) {
            return Ok(service.clone());
        }

        let record = self
            .inner
            .store
            .find_by_name(name)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("service '{name}' not found")))?;
        if record.service_type != SERVICE_TYPE {
            return Err(ApiError::NotFound(format!(
                "service '{name}' is not a SQL DB service"
            )));
        }
        if !record.is_active {
            return Err(ApiError::Forbidden(format!("service '{name}' is not active")));
        }
        let config = self
            .inner
            .store
            .get_config(record.id)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(format!("service '{name}' has no connection configuration"))
            })?;

        let service = Arc::new(
            SqlDbService::from_config(&record.name, &config, self.inner.connector.as_ref())
                .await?,
        );

        let mut services = self.inner.services.write().await;
        Ok(services.entry(record.name).or_insert(service).clone())
    }

    /// Drop the live instance for a deleted or reconfigured service.
    pub async fn evict(&self, name: &str) {
        let removed = self.inner.services.write().await.remove(name);
        if let Some(service) = removed {
            service.shutdown().await;
        }
    }
}
