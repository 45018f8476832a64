//! Access-component enumeration.
//!
//! Builds the permission-filtered list of addressable resource paths for a
//! service. Kinds appear in fixed order; within a kind, the `/` and `/*`
//! markers (when the caller holds any right on the kind) precede the
//! individually named entries, which stay in introspection order.

use crate::error::ServiceError;
use crate::resource::{ResourceKind, ResourceType};
use portico_core::{PermissionOracle, ResourceList};
use portico_driver::DbDriver;

/// The static resource-kind listing served when access components were
/// not requested.
pub fn resource_kinds() -> ResourceList {
    ResourceList::new(
        ResourceKind::ALL
            .iter()
            .map(|kind| kind.as_str().to_string())
            .collect(),
    )
}

/// The same table with display labels, for callers that request resource
/// properties.
pub fn resource_types() -> ResourceList<ResourceType> {
    ResourceList::new(ResourceKind::ALL.map(ResourceType::from).to_vec())
}

/// Enumerate every resource path the caller may access.
///
/// Schema and table views are both built from one catalog listing;
/// procedures and functions each use their own. `refresh` forces the
/// driver to re-read the object catalog.
pub async fn access_components(
    driver: &dyn DbDriver,
    oracle: &dyn PermissionOracle,
    refresh: bool,
) -> Result<ResourceList, ServiceError> {
    let mut resources = Vec::new();

    push_markers(&mut resources, ResourceKind::Schema, oracle).await;
    let tables = driver.list_schemas_and_tables(refresh).await?;
    push_named(&mut resources, ResourceKind::Schema, &tables, oracle).await;

    push_markers(&mut resources, ResourceKind::Table, oracle).await;
    push_named(&mut resources, ResourceKind::Table, &tables, oracle).await;

    push_markers(&mut resources, ResourceKind::Procedure, oracle).await;
    let procedures = driver.list_stored_procedures().await?;
    push_named(&mut resources, ResourceKind::Procedure, &procedures, oracle).await;

    push_markers(&mut resources, ResourceKind::Function, oracle).await;
    let functions = driver.list_stored_functions().await?;
    push_named(&mut resources, ResourceKind::Function, &functions, oracle).await;

    Ok(ResourceList::new(resources))
}

/// Append `kind/` and `kind/*` when the caller holds any right on the
/// kind itself.
async fn push_markers(out: &mut Vec<String>, kind: ResourceKind, oracle: &dyn PermissionOracle) {
    let prefix = format!("{kind}/");
    if !oracle.rights(&prefix).await.is_empty() {
        out.push(prefix.clone());
        out.push(format!("{prefix}*"));
    }
}

/// Append each introspected name the caller may reach.
async fn push_named(
    out: &mut Vec<String>,
    kind: ResourceKind,
    names: &[String],
    oracle: &dyn PermissionOracle,
) {
    for name in names {
        let path = format!("{kind}/{name}");
        if !oracle.rights(&path).await.is_empty() {
            out.push(path);
        }
    }
}
