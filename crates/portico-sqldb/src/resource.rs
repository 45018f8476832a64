//! The four addressable resource kinds under a database service.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Schema,
    Table,
    Procedure,
    Function,
}

impl ResourceKind {
    /// Fixed enumeration order for every listing.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Schema,
        ResourceKind::Table,
        ResourceKind::Procedure,
        ResourceKind::Function,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Table => "table",
            Self::Procedure => "procedure",
            Self::Function => "function",
        }
    }

    /// Display label for the resource-type table.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Schema => "Schema",
            Self::Table => "Table",
            Self::Procedure => "Stored Procedures",
            Self::Function => "Stored Functions",
        }
    }

    /// Parse the leading path segment of a resource request.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "schema" => Some(Self::Schema),
            "table" => Some(Self::Table),
            "procedure" => Some(Self::Procedure),
            "function" => Some(Self::Function),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the resource-type table: the kind name plus its display
/// label, served when the caller asks for resource properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceType {
    pub name: &'static str,
    pub label: &'static str,
}

impl From<ResourceKind> for ResourceType {
    fn from(kind: ResourceKind) -> Self {
        Self {
            name: kind.as_str(),
            label: kind.label(),
        }
    }
}
