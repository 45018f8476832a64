//! The SQL database service.
//!
//! One service instance owns exactly one driver connection. Construction
//! validates configuration, opens the driver, and layers attribute
//! defaults for the detected engine family under any user-supplied
//! overrides. All request handling is synchronous to completion; the host
//! arbitrates concurrent requests against the same instance.

use crate::access::validate_resource_access;
use crate::catalog;
use crate::config::SqlDbConfig;
use crate::error::ServiceError;
use crate::resource::{ResourceKind, ResourceType};
use portico_core::{AccessRight, PermissionOracle, ResourceList};
use portico_driver::{
    DbDriver, DriverConnector, DriverError, DriverFamily, TableDescription, default_attributes,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// A host service backed by one SQL database connection.
pub struct SqlDbService {
    name: String,
    driver: Box<dyn DbDriver>,
    family: DriverFamily,
    closed: AtomicBool,
}

/// What a resource request resolves to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceResponse {
    /// A name listing under the `resource` field.
    Names(ResourceList),
    /// A table description.
    Table(TableDescription),
}

impl SqlDbService {
    /// Build a service from stored configuration.
    ///
    /// The DSN is validated before any connection attempt. Exactly one
    /// driver is opened; engine-family attribute defaults are applied
    /// first and user-supplied attributes override them.
    pub async fn from_config(
        name: impl Into<String>,
        config: &SqlDbConfig,
        connector: &dyn DriverConnector,
    ) -> Result<Self, ServiceError> {
        let name = name.into();
        config.validate()?;
        let options = config.parsed_options()?;
        let attributes = config.parsed_attributes()?;

        let driver = connector
            .open(
                &config.effective_dsn(),
                config.username.as_deref(),
                config.password.as_deref(),
                &options,
            )
            .await
            .map_err(|e| match e {
                DriverError::InvalidDsn(msg) => ServiceError::Configuration(msg),
                DriverError::UnsupportedFamily(family) => {
                    ServiceError::Configuration(format!("unsupported driver family: {family}"))
                }
                other => ServiceError::Connection(other.to_string()),
            })?;

        let family = driver.family();
        for (key, value) in default_attributes(family) {
            driver.set_attribute(key, value);
        }
        if !attributes.is_empty() {
            driver.set_attributes(&attributes);
        }

        tracing::info!(service = %name, family = %family, "database service connected");

        Ok(Self {
            name,
            driver,
            family,
            closed: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> DriverFamily {
        self.family
    }

    pub fn driver(&self) -> &dyn DbDriver {
        self.driver.as_ref()
    }

    /// Reactivate the connection if it has gone inactive.
    pub async fn ensure_connected(&self) -> Result<(), ServiceError> {
        if self.driver.is_active() {
            return Ok(());
        }
        self.driver
            .set_active(true)
            .await
            .map_err(|e| ServiceError::Connection(format!("failed to connect to database: {e}")))
    }

    /// Release the connection. Runs at most once; a failing disconnect is
    /// logged and swallowed so caller cleanup never blocks on it.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.driver.set_active(false).await {
            tracing::warn!(service = %self.name, error = %e, "failed to disconnect from database");
        }
    }

    /// The plain resource-kind listing.
    pub fn list_resources(&self) -> ResourceList {
        catalog::resource_kinds()
    }

    /// The resource-kind listing with display labels.
    pub fn list_resource_types(&self) -> ResourceList<ResourceType> {
        catalog::resource_types()
    }

    /// The permission-filtered access-component listing.
    pub async fn list_access_components(
        &self,
        oracle: &dyn PermissionOracle,
        refresh: bool,
    ) -> Result<ResourceList, ServiceError> {
        self.ensure_connected().await?;
        catalog::access_components(self.driver.as_ref(), oracle, refresh).await
    }

    /// Route a resource request: resolve the permission path, check the
    /// caller's rights, then serve the matching catalog operation.
    pub async fn handle_resource(
        &self,
        path: &str,
        action: AccessRight,
        oracle: &dyn PermissionOracle,
        refresh: bool,
    ) -> Result<ResourceResponse, ServiceError> {
        let path = path.trim_matches('/');
        let (segment, sub) = match path.split_once('/') {
            Some((segment, sub)) => (segment, sub),
            None => (path, ""),
        };

        // Unknown segments used to fall back to an implicit table lookup;
        // that shim is gone and they fail as-is.
        let kind = ResourceKind::from_segment(segment)
            .ok_or_else(|| ServiceError::NotFound(format!("resource '{segment}' not found")))?;

        validate_resource_access(kind, sub, action, oracle).await?;
        self.ensure_connected().await?;

        match (kind, sub) {
            (ResourceKind::Schema | ResourceKind::Table, "") => {
                let names = self.driver.list_schemas_and_tables(refresh).await?;
                Ok(ResourceResponse::Names(ResourceList::new(names)))
            }
            (ResourceKind::Procedure, "") => {
                let names = self.driver.list_stored_procedures().await?;
                Ok(ResourceResponse::Names(ResourceList::new(names)))
            }
            (ResourceKind::Function, "") => {
                let names = self.driver.list_stored_functions().await?;
                Ok(ResourceResponse::Names(ResourceList::new(names)))
            }
            (ResourceKind::Schema, table) => match self.driver.describe_table(table).await? {
                Some(description) => Ok(ResourceResponse::Table(description)),
                None => Err(ServiceError::NotFound(format!("table '{table}' not found"))),
            },
            // Record-level operations live with the host's data dispatch,
            // not in this catalog surface.
            (_, sub) => Err(ServiceError::NotFound(format!(
                "resource '{kind}/{sub}' not found"
            ))),
        }
    }
}
