//! Error taxonomy for the SQL DB service.
//!
//! Every failure surfaces synchronously to the immediate caller; nothing
//! in this crate retries. The host's error-to-HTTP translator maps the
//! variants to status codes.

use portico_driver::DriverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid or missing configuration. Fatal at construction, never
    /// retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The connection could not be activated.
    #[error("connection error: {0}")]
    Connection(String),

    /// The permission oracle denied the path before dispatch.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No resource matches the request path.
    #[error("not found: {0}")]
    NotFound(String),

    /// A driver call failed after the connection was established.
    #[error(transparent)]
    Driver(#[from] DriverError),
}
