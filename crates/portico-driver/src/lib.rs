//! Generic database driver abstraction.
//!
//! A [`DbDriver`] wraps one live connection to an external SQL database:
//! activation state, driver attributes, and catalog introspection (tables,
//! stored procedures, stored functions). Services obtain drivers through a
//! [`DriverConnector`], which lets tests substitute recording stubs without
//! touching a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod family;
mod mysql;
mod postgres;

pub use family::{DriverFamily, attr, default_attributes};
pub use mysql::MySqlDriver;
pub use postgres::PostgresDriver;

/// Errors surfaced by drivers and connectors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No driver is available for the classified family.
    #[error("unsupported driver family: {0}")]
    UnsupportedFamily(DriverFamily),

    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidDsn(String),

    /// Activating or deactivating the connection failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// An introspection query failed.
    #[error("driver query failed: {0}")]
    Sql(#[from] sqlx::Error),
}

/// One column of a described table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Catalog description of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub columns: Vec<ColumnDescription>,
    pub primary_key: Vec<String>,
}

/// One live connection to an external SQL database.
///
/// Drivers own their interior mutability (attribute map, catalog cache);
/// callers hold them behind a shared reference and add no locking of their
/// own. All introspection calls are read-only.
#[async_trait]
pub trait DbDriver: Send + Sync {
    /// The engine family of the opened connection.
    fn family(&self) -> DriverFamily;

    /// Set one driver attribute.
    fn set_attribute(&self, key: &str, value: &str);

    /// Set a batch of attributes.
    fn set_attributes(&self, attrs: &BTreeMap<String, String>) {
        for (key, value) in attrs {
            self.set_attribute(key, value);
        }
    }

    /// Read an attribute back, if set.
    fn attribute(&self, key: &str) -> Option<String>;

    /// Whether the connection is currently active.
    fn is_active(&self) -> bool;

    /// Connect (`true`) or disconnect (`false`).
    async fn set_active(&self, active: bool) -> Result<(), DriverError>;

    /// Names of all schemas and tables in the database's object catalog,
    /// in introspection order. One call serves both the schema and table
    /// resource kinds. `refresh` bypasses any driver-side cache.
    async fn list_schemas_and_tables(&self, refresh: bool) -> Result<Vec<String>, DriverError>;

    /// Names of all stored procedures, in introspection order.
    async fn list_stored_procedures(&self) -> Result<Vec<String>, DriverError>;

    /// Names of all stored functions, in introspection order.
    async fn list_stored_functions(&self) -> Result<Vec<String>, DriverError>;

    /// Describe one table by (optionally schema-qualified) name.
    /// `None` when the catalog has no such table.
    async fn describe_table(&self, name: &str) -> Result<Option<TableDescription>, DriverError>;
}

/// Opens drivers from connection configuration.
///
/// Connection-level `options` ride along at open time; attributes are
/// applied by the caller after the driver is handed back.
#[async_trait]
pub trait DriverConnector: Send + Sync {
    async fn open(
        &self,
        dsn: &str,
        username: Option<&str>,
        password: Option<&str>,
        options: &BTreeMap<String, String>,
    ) -> Result<Box<dyn DbDriver>, DriverError>;
}

/// The production connector: classifies the DSN and opens the matching
/// sqlx-backed driver.
pub struct SqlxConnector;

#[async_trait]
impl DriverConnector for SqlxConnector {
    async fn open(
        &self,
        dsn: &str,
        username: Option<&str>,
        password: Option<&str>,
        options: &BTreeMap<String, String>,
    ) -> Result<Box<dyn DbDriver>, DriverError> {
        match DriverFamily::from_dsn(dsn) {
            DriverFamily::Postgres => Ok(Box::new(
                PostgresDriver::open(dsn, username, password, options).await?,
            )),
            DriverFamily::MySql => Ok(Box::new(
                MySqlDriver::open(dsn, username, password, options).await?,
            )),
            family => Err(DriverError::UnsupportedFamily(family)),
        }
    }
}
