//! SQL database service plugin for the Portico platform.
//!
//! Registers a SQL connection as a host service, exposes the database's
//! schema/table/procedure/function catalog under the service's REST path,
//! and persists per-service connection configuration in the platform
//! database. Record-level data operations belong to the host's dispatch
//! layer; this crate supplies the resource-name table, the permission-path
//! resolver, and the access-component enumeration.

pub mod access;
pub mod catalog;
pub mod config;
pub mod error;
pub mod resource;
pub mod service;
pub mod store;

pub use config::SqlDbConfig;
pub use error::ServiceError;
pub use resource::{ResourceKind, ResourceType};
pub use service::{ResourceResponse, SqlDbService};
pub use store::{ConfigStore, NewService, ServiceRecord, StoreError};

/// The registry `type` value this plugin serves.
pub const SERVICE_TYPE: &str = "sql_db";
