//! REST response envelopes.
//!
//! Every Portico listing responds as `{"resource": [...]}` and every
//! record operation as `{"record": [...]}`. Field projection via the
//! `fields` query option is applied to record envelopes before they leave
//! the handler.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Listing envelope: `{"resource": [...]}`.
///
/// Listings carry plain names by default; typed entries (name plus
/// properties) use the same envelope with a different item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList<T = String> {
    pub resource: Vec<T>,
}

impl<T> ResourceList<T> {
    pub fn new(resource: Vec<T>) -> Self {
        Self { resource }
    }
}

/// Record-set envelope: `{"record": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    pub record: Vec<Value>,
}

impl RecordSet {
    pub fn new(record: Vec<Value>) -> Self {
        Self { record }
    }

    /// Apply the `fields` query option: keep only the named fields on each
    /// record. `None`, an empty list, and `*` all mean "everything".
    pub fn project(mut self, fields: Option<&str>) -> Self {
        let Some(fields) = fields else { return self };
        let wanted: Vec<&str> = fields
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        if wanted.is_empty() || wanted.contains(&"*") {
            return self;
        }

        for record in &mut self.record {
            if let Value::Object(map) = record {
                map.retain(|key, _| wanted.contains(&key.as_str()));
            }
        }
        self
    }
}
