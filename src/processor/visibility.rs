//! Per-alias field visibility
//!
//! A field's `public` key controls which aliases can see it:
//! `true` (default) everywhere, `false` nowhere, or a list of aliases.

use serde_json::Value;

use super::{fields_mut, ConfigProcessor};
use crate::error::ConfigError;
use crate::raw::{self, RawConfig};

/// Drops fields hidden from the configuration's alias
pub struct VisibilityProcessor;

impl ConfigProcessor for VisibilityProcessor {
    fn name(&self) -> &'static str {
        "visibility"
    }

    fn apply(&self, config: &mut RawConfig) -> Result<(), ConfigError> {
        let alias = config.alias().to_string();

        for key in config.keys() {
            let Some(declaration) = config.get_mut(&key) else {
                continue;
            };
            if !raw::declared_kind(&key, declaration)?.has_fields() {
                continue;
            }
            let fields = fields_mut(&key, raw::config_of_mut(&key, declaration)?)?;

            let mut hidden = Vec::new();
            for (name, field) in fields.iter_mut() {
                let Value::Object(field) = field else {
                    continue;
                };
                let path = format!("{}.{}.public", key, name);
                if !is_visible(&path, field.remove("public").as_ref(), &alias)? {
                    hidden.push(name.clone());
                }
            }
            fields.retain(|name, _| !hidden.contains(name));

            if fields.is_empty() {
                return Err(ConfigError::EmptyFields(key));
            }
        }
        Ok(())
    }
}

fn is_visible(path: &str, public: Option<&Value>, alias: &str) -> Result<bool, ConfigError> {
    match public {
        None | Some(Value::Null) => Ok(true),
        Some(Value::Bool(public)) => Ok(*public),
        Some(Value::Array(_)) => {
            let aliases = raw::string_list(path, public)?;
            Ok(aliases.iter().any(|a| a == alias))
        }
        Some(other) => Err(ConfigError::InvalidValue {
            path: path.to_string(),
            message: format!("expected a boolean or a list of aliases, got {}", raw::json_kind(other)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::test_support::*;
    use serde_json::json;

    fn user() -> Value {
        json!({
            "User": {"type": "object", "config": {"fields": {
                "username": {"type": "String!"},
                "email": {"type": "String", "public": ["internal"]},
                "password": {"type": "String", "public": false},
                "id": {"type": "ID", "public": true}
            }}}
        })
    }

    #[test]
    fn test_filters_per_alias() {
        let public = processed_as(&VisibilityProcessor, "public", user());
        assert_eq!(
            public.get("User").unwrap()["config"]["fields"],
            json!({"username": {"type": "String!"}, "id": {"type": "ID"}})
        );

        let internal = processed_as(&VisibilityProcessor, "internal", user());
        assert_eq!(
            internal.get("User").unwrap()["config"]["fields"],
            json!({"username": {"type": "String!"}, "email": {"type": "String"}, "id": {"type": "ID"}})
        );
    }

    #[test]
    fn test_all_fields_hidden() {
        let err = rejected(
            &VisibilityProcessor,
            json!({"Secret": {"type": "object", "config": {"fields": {"key": {"type": "String", "public": ["internal"]}}}}}),
        );
        assert_eq!(err, ConfigError::EmptyFields("Secret".to_string()));
    }

    #[test]
    fn test_invalid_flag() {
        let err = rejected(
            &VisibilityProcessor,
            json!({"User": {"type": "object", "config": {"fields": {"name": {"type": "String", "public": "yes"}}}}}),
        );
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_rerun_rejected() {
        assert_rerun_rejected(&VisibilityProcessor, user());
    }
}
