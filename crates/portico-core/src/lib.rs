//! Platform contracts shared by Portico service plugins.
//!
//! Plugins never talk to the authorization layer or the REST dispatcher
//! directly; they build against the seams defined here. The host injects
//! concrete implementations at service construction time.

pub mod access;
pub mod de;
pub mod envelope;

pub use access::{AccessRight, AccessSet, AllowAllOracle, PermissionOracle, StaticOracle, full_access};
pub use envelope::{RecordSet, ResourceList};
