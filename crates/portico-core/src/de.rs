//! Serde helpers for loosely-typed values REST clients send.

use serde::Deserializer;
use serde::de::{Error, Visitor};
use std::fmt;

struct BoolIshVisitor;

impl<'de> Visitor<'de> for BoolIshVisitor {
    type Value = bool;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a boolean, 0/1, or \"true\"/\"false\"")
    }

    fn visit_bool<E: Error>(self, value: bool) -> Result<bool, E> {
        Ok(value)
    }

    fn visit_i64<E: Error>(self, value: i64) -> Result<bool, E> {
        Ok(value != 0)
    }

    fn visit_u64<E: Error>(self, value: u64) -> Result<bool, E> {
        Ok(value != 0)
    }

    fn visit_str<E: Error>(self, value: &str) -> Result<bool, E> {
        match value.trim().to_ascii_lowercase().as_str() {
            // A bare query flag (`?refresh`) arrives as an empty string and
            // means "present".
            "" | "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(E::custom(format!("not a boolean: {other}"))),
        }
    }
}

/// Accept booleans written as JSON bools, 0/1 numbers, or query-string
/// text. Clients of the original API send `"is_active": 1` and
/// `?as_access_components=true` interchangeably.
pub fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    deserializer.deserialize_any(BoolIshVisitor)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "super::flexible_bool")]
        refresh: bool,
    }

    #[test]
    fn test_json_number() {
        let flags: Flags = serde_json::from_str(r#"{"refresh": 1}"#).unwrap();
        assert!(flags.refresh);
    }

    #[test]
    fn test_json_bool() {
        let flags: Flags = serde_json::from_str(r#"{"refresh": false}"#).unwrap();
        assert!(!flags.refresh);
    }

    #[test]
    fn test_string_forms() {
        let flags: Flags = serde_json::from_str(r#"{"refresh": "true"}"#).unwrap();
        assert!(flags.refresh);
        let flags: Flags = serde_json::from_str(r#"{"refresh": "0"}"#).unwrap();
        assert!(!flags.refresh);
    }

    #[test]
    fn test_missing_defaults_false() {
        let flags: Flags = serde_json::from_str("{}").unwrap();
        assert!(!flags.refresh);
    }
}
