//! Persisted service configuration.
//!
//! One `sql_db_config` row per database-backed service, keyed one-to-one
//! with the host's `service` row and removed with it by the cascade. The
//! `options` and `attributes` columns hold JSON objects of scalars,
//! interpreted as key-value sets by the driver layer.

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SqlDbConfig {
    /// Driver-specific connection descriptor. Required; empty means the
    /// service cannot be constructed.
    #[serde(default)]
    pub dsn: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Never serialized back out in responses.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Logical database/catalog name, used when the DSN does not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,

    /// Connection-level driver options (charset, timeouts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,

    /// Low-level driver attributes (error mode, statement emulation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<String>,
}

impl SqlDbConfig {
    /// Reject configurations that can never open a connection.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.dsn.trim().is_empty() {
            return Err(ServiceError::Configuration(
                "database connection string (DSN) can not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The DSN with the logical database name folded in when the DSN
    /// itself does not name one. URL-style DSNs carry the database in the
    /// path; key-value DSNs are left alone.
    pub fn effective_dsn(&self) -> String {
        let Some(db) = self.db.as_deref().filter(|db| !db.is_empty()) else {
            return self.dsn.clone();
        };
        match self.dsn.split_once("://") {
            Some((_, rest)) if !rest.contains('/') => format!("{}/{db}", self.dsn),
            _ => self.dsn.clone(),
        }
    }

    /// Connection-level options, parsed.
    pub fn parsed_options(&self) -> Result<BTreeMap<String, String>, ServiceError> {
        parse_kv_text(self.options.as_deref(), "options")
    }

    /// Driver attributes, parsed.
    pub fn parsed_attributes(&self) -> Result<BTreeMap<String, String>, ServiceError> {
        parse_kv_text(self.attributes.as_deref(), "attributes")
    }
}

/// Parse a stored key-value column: a JSON object whose values are
/// scalars. Booleans become "1"/"0" the way drivers expect toggles.
fn parse_kv_text(
    text: Option<&str>,
    column: &str,
) -> Result<BTreeMap<String, String>, ServiceError> {
    let Some(text) = text.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(BTreeMap::new());
    };

    let value: Value = serde_json::from_str(text)
        .map_err(|e| ServiceError::Configuration(format!("invalid {column}: {e}")))?;
    let Value::Object(map) = value else {
        return Err(ServiceError::Configuration(format!(
            "invalid {column}: expected a JSON object"
        )));
    };

    let mut out = BTreeMap::new();
    for (key, value) in map {
        let value = match value {
            Value::String(s) => s,
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => "0".to_string(),
            Value::Number(n) => n.to_string(),
            _ => {
                return Err(ServiceError::Configuration(format!(
                    "invalid {column}: value for '{key}' must be a scalar"
                )));
            }
        };
        out.insert(key, value);
    }
    Ok(out)
}
