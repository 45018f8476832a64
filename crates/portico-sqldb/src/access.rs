//! Permission-path construction and pre-dispatch access checks.

use crate::error::ServiceError;
use crate::resource::ResourceKind;
use portico_core::{AccessRight, PermissionOracle};

/// Compose the permission path for a resource request.
///
/// Schema and table sub-resources pass through verbatim and may nest
/// further path segments. Procedure and function sub-resources are bare
/// routine names: any parenthesized call-argument suffix is dropped and
/// trailing separators trimmed, so `sum(1,2)` checks as `procedure/sum`.
pub fn resolve_permission_path(kind: ResourceKind, sub: &str) -> String {
    let mut path = format!("{kind}/");
    match kind {
        ResourceKind::Schema | ResourceKind::Table => {
            if !sub.is_empty() {
                path.push_str(sub);
            }
        }
        ResourceKind::Procedure | ResourceKind::Function => {
            if !sub.is_empty() {
                let name = sub.split_once('(').map_or(sub, |(name, _)| name);
                path.push_str(name.trim_end().trim_end_matches('/'));
            }
        }
    }
    path
}

/// Check the caller's rights on a resource path.
///
/// Runs before dispatch; when the right is missing no handler executes.
pub async fn validate_resource_access(
    kind: ResourceKind,
    sub: &str,
    action: AccessRight,
    oracle: &dyn PermissionOracle,
) -> Result<(), ServiceError> {
    let path = resolve_permission_path(kind, sub);
    if oracle.rights(&path).await.contains(&action) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "access denied to {path} for {action}"
        )))
    }
}
