//! Deprecation normalization
//!
//! `deprecated: true` or `deprecated: "reason"` on fields and enum values
//! becomes a `deprecationReason` string.

use serde_json::{Map, Value};

use super::ConfigProcessor;
use crate::error::ConfigError;
use crate::raw::{self, DeclaredKind, RawConfig};

pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Normalizes `deprecated` flags into `deprecationReason`
pub struct DeprecationProcessor;

impl ConfigProcessor for DeprecationProcessor {
    fn name(&self) -> &'static str {
        "deprecation"
    }

    fn apply(&self, config: &mut RawConfig) -> Result<(), ConfigError> {
        for key in config.keys() {
            let Some(declaration) = config.get_mut(&key) else {
                continue;
            };
            let table = match raw::declared_kind(&key, declaration)? {
                DeclaredKind::Object | DeclaredKind::Interface => "fields",
                DeclaredKind::Enum => "values",
                _ => continue,
            };
            let settings = raw::config_of_mut(&key, declaration)?;
            let Some(Value::Object(entries)) = settings.get_mut(table) else {
                continue;
            };
            for (name, entry) in entries.iter_mut() {
                if let Value::Object(entry) = entry {
                    normalize(&format!("{}.{}", key, name), entry)?;
                }
            }
        }
        Ok(())
    }
}

fn normalize(path: &str, entry: &mut Map<String, Value>) -> Result<(), ConfigError> {
    let reason = match entry.remove("deprecated") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::Bool(true)) => Some(DEFAULT_DEPRECATION_REASON.to_string()),
        Some(Value::String(reason)) => Some(reason),
        Some(other) => {
            return Err(ConfigError::InvalidValue {
                path: format!("{}.deprecated", path),
                message: format!("expected a boolean or a reason, got {}", raw::json_kind(&other)),
            })
        }
    };

    let explicit = entry.get("deprecationReason").cloned();
    match (reason, explicit) {
        (_, Some(Value::String(_))) | (None, None) | (None, Some(Value::Null)) => Ok(()),
        (Some(reason), None) | (Some(reason), Some(Value::Null)) => {
            entry.insert("deprecationReason".to_string(), Value::String(reason));
            Ok(())
        }
        (_, Some(other)) => Err(ConfigError::InvalidValue {
            path: format!("{}.deprecationReason", path),
            message: format!("expected a string, got {}", raw::json_kind(&other)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::test_support::*;
    use serde_json::json;

    #[test]
    fn test_normalizes_fields_and_values() {
        let config = processed(
            &DeprecationProcessor,
            json!({
                "User": {"type": "object", "config": {"fields": {
                    "login": {"type": "String", "deprecated": true},
                    "nick": {"type": "String", "deprecated": "Use username"},
                    "old": {"type": "String", "deprecated": true, "deprecationReason": "Explicit"},
                    "name": {"type": "String", "deprecated": false}
                }}},
                "Role": {"type": "enum", "config": {"values": {"GUEST": {"value": "GUEST", "deprecated": true}}}}
            }),
        );

        let fields = &config.get("User").unwrap()["config"]["fields"];
        assert_eq!(fields["login"], json!({"type": "String", "deprecationReason": "No longer supported"}));
        assert_eq!(fields["nick"], json!({"type": "String", "deprecationReason": "Use username"}));
        assert_eq!(fields["old"], json!({"type": "String", "deprecationReason": "Explicit"}));
        assert_eq!(fields["name"], json!({"type": "String"}));
        assert_eq!(
            config.get("Role").unwrap()["config"]["values"]["GUEST"],
            json!({"value": "GUEST", "deprecationReason": "No longer supported"})
        );
    }

    #[test]
    fn test_invalid_flag() {
        let err = rejected(
            &DeprecationProcessor,
            json!({"User": {"type": "object", "config": {"fields": {"login": {"type": "String", "deprecated": 1}}}}}),
        );
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_rerun_rejected() {
        assert_rerun_rejected(
            &DeprecationProcessor,
            json!({"User": {"type": "object", "config": {"fields": {"login": {"type": "String"}}}}}),
        );
    }
}
