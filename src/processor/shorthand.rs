//! Shorthand expansion
//!
//! `"username": "String!"` becomes `"username": {"type": "String!"}` for
//! fields and arguments, and enum value lists become value tables. After this
//! processor every field, argument and enum value is a table.

use serde_json::{json, Map, Value};

use super::{fields_mut, ConfigProcessor};
use crate::error::ConfigError;
use crate::raw::{self, DeclaredKind, RawConfig};

/// Expands shorthand field, argument and enum value syntax
pub struct ShorthandProcessor;

impl ConfigProcessor for ShorthandProcessor {
    fn name(&self) -> &'static str {
        "shorthand"
    }

    fn apply(&self, config: &mut RawConfig) -> Result<(), ConfigError> {
        for key in config.keys() {
            let Some(declaration) = config.get_mut(&key) else {
                continue;
            };
            let kind = raw::declared_kind(&key, declaration)?;
            let inherits = declaration.get("inherits").is_some();

            if kind == DeclaredKind::CustomScalar && declaration.get("config").is_none() {
                declaration["config"] = json!({});
            }
            let settings = raw::config_of_mut(&key, declaration)?;

            match kind {
                DeclaredKind::Object | DeclaredKind::Interface | DeclaredKind::InputObject => {
                    if inherits && !settings.contains_key("fields") {
                        settings.insert("fields".to_string(), json!({}));
                    }
                    let with_args = kind != DeclaredKind::InputObject;
                    expand_fields(&key, fields_mut(&key, settings)?, with_args)?;
                }
                DeclaredKind::Union => {
                    if !settings.contains_key("types") {
                        return Err(raw::missing(&key, "config.types"));
                    }
                    raw::string_list(&format!("{}.config.types", key), settings.get("types"))?;
                }
                DeclaredKind::Enum => {
                    let values = settings
                        .remove("values")
                        .ok_or_else(|| raw::missing(&key, "config.values"))?;
                    settings.insert("values".to_string(), Value::Object(expand_values(&key, values)?));
                }
                DeclaredKind::CustomScalar | DeclaredKind::RelayConnection => {}
            }
        }
        Ok(())
    }
}

fn expand_fields(type_name: &str, fields: &mut Map<String, Value>, with_args: bool) -> Result<(), ConfigError> {
    for (name, field) in fields.iter_mut() {
        let path = format!("{}.{}", type_name, name);
        expand_typed(&path, field)?;
        if !with_args {
            continue;
        }
        match field.get_mut("args") {
            None | Some(Value::Null) => {}
            Some(Value::Object(args)) => {
                for (arg_name, arg) in args.iter_mut() {
                    expand_typed(&format!("{}({})", path, arg_name), arg)?;
                }
            }
            Some(other) => return Err(raw::not_a_table(&format!("{}.args", path), other)),
        }
    }
    Ok(())
}

/// A field or argument: either a type string or a table with a `type` key
fn expand_typed(path: &str, value: &mut Value) -> Result<(), ConfigError> {
    match value {
        Value::String(type_ref) => {
            *value = json!({"type": type_ref.clone()});
            Ok(())
        }
        Value::Object(table) => match table.get("type") {
            Some(Value::String(_)) => Ok(()),
            Some(_) => Err(ConfigError::InvalidValue {
                path: format!("{}.type", path),
                message: "expected a type string".to_string(),
            }),
            None => Err(raw::missing(path, "type")),
        },
        other => Err(ConfigError::InvalidValue {
            path: path.to_string(),
            message: format!("expected a type string or a table, got {}", raw::json_kind(other)),
        }),
    }
}

fn expand_values(type_name: &str, values: Value) -> Result<Map<String, Value>, ConfigError> {
    let path = format!("{}.config.values", type_name);
    let mut expanded = Map::new();
    match values {
        Value::Array(items) => {
            for item in items {
                let name = item.as_str().ok_or_else(|| ConfigError::InvalidValue {
                    path: path.clone(),
                    message: "expected a list of value names".to_string(),
                })?;
                expanded.insert(name.to_string(), json!({"value": name}));
            }
        }
        Value::Object(items) => {
            for (name, item) in items {
                let entry = match item {
                    Value::Null => json!({"value": name}),
                    Value::Object(mut table) => {
                        table.entry("value").or_insert_with(|| json!(name));
                        Value::Object(table)
                    }
                    other => json!({"value": other}),
                };
                expanded.insert(name, entry);
            }
        }
        other => return Err(raw::not_a_table(&path, &other)),
    }
    Ok(expanded)
}
