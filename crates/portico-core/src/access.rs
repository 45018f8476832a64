//! Access rights and the permission-oracle seam.
//!
//! The host platform owns authorization. Plugins ask it "what rights does
//! the caller have on this path?" through [`PermissionOracle`] and treat an
//! empty answer as no access. Paths are the slash-joined resource paths the
//! plugin itself composes (`table/`, `table/orders`, `procedure/sum`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A single right the caller may hold on a resource path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRight {
    /// Read the resource (GET).
    Read,
    /// Create records or sub-resources (POST).
    Create,
    /// Modify existing records (PATCH/PUT).
    Update,
    /// Remove records or sub-resources (DELETE).
    Delete,
}

impl std::fmt::Display for AccessRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl AccessRight {
    /// Every right, in declaration order.
    pub const ALL: [AccessRight; 4] = [
        AccessRight::Read,
        AccessRight::Create,
        AccessRight::Update,
        AccessRight::Delete,
    ];
}

/// The set of rights granted on one path. Empty means no access.
pub type AccessSet = BTreeSet<AccessRight>;

/// Build a set holding every right.
pub fn full_access() -> AccessSet {
    AccessSet::from(AccessRight::ALL)
}

/// Answers permission queries for resource paths.
///
/// Implementations are read-only with respect to plugin state and safe to
/// call in any order; the plugin performs no caching of answers.
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    /// The rights the current caller holds on `path`.
    async fn rights(&self, path: &str) -> AccessSet;
}

/// Grants every right on every path.
///
/// Development and test wiring only; production deployments configure a
/// real grants table or an external authorization service.
pub struct AllowAllOracle;

#[async_trait]
impl PermissionOracle for AllowAllOracle {
    async fn rights(&self, _path: &str) -> AccessSet {
        full_access()
    }
}

/// A fixed path-grants table.
///
/// Lookup is exact first; a `prefix/*` entry then covers any single named
/// entry under that prefix (`table/*` matches `table/orders` but not the
/// kind-level `table/` path itself).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticOracle {
    grants: HashMap<String, AccessSet>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grant, builder style.
    pub fn grant(
        mut self,
        path: impl Into<String>,
        rights: impl IntoIterator<Item = AccessRight>,
    ) -> Self {
        self.grants.insert(path.into(), rights.into_iter().collect());
        self
    }

    /// Whether the table holds no grants at all.
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Resolve the rights for `path` without going through the trait.
    pub fn lookup(&self, path: &str) -> AccessSet {
        if let Some(rights) = self.grants.get(path) {
            return rights.clone();
        }

        if let Some((prefix, name)) = path.rsplit_once('/')
            && !name.is_empty()
            && let Some(rights) = self.grants.get(&format!("{prefix}/*"))
        {
            return rights.clone();
        }

        AccessSet::new()
    }
}

#[async_trait]
impl PermissionOracle for StaticOracle {
    async fn rights(&self, path: &str) -> AccessSet {
        self.lookup(path)
    }
}
