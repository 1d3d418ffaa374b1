//! Type naming
//!
//! Every declaration gets an explicit `config.name` (defaulting to its key).
//! Names must be valid GraphQL names and unique across the alias, counting
//! both keys and explicit names, since either may be used to look a type up.

use serde_json::Value;
use std::collections::HashMap;

use super::ConfigProcessor;
use crate::error::ConfigError;
use crate::raw::{self, RawConfig};
use crate::type_ref::is_valid_name;

/// Assigns and validates GraphQL type names
pub struct NamedProcessor;

impl ConfigProcessor for NamedProcessor {
    fn name(&self) -> &'static str {
        "named"
    }

    fn apply(&self, config: &mut RawConfig) -> Result<(), ConfigError> {
        // name or key -> declaring key
        let mut owners: HashMap<String, String> = config
            .keys()
            .into_iter()
            .map(|key| (key.clone(), key))
            .collect();

        for key in config.keys() {
            let Some(declaration) = config.get_mut(&key) else {
                continue;
            };
            let settings = raw::config_of_mut(&key, declaration)?;
            let name = match settings.get("name") {
                None | Some(Value::Null) => key.clone(),
                Some(Value::String(name)) => name.clone(),
                Some(_) => {
                    return Err(ConfigError::InvalidValue {
                        path: format!("{}.config.name", key),
                        message: "expected a string".to_string(),
                    })
                }
            };

            if !is_valid_name(&name) {
                return Err(ConfigError::InvalidName(name));
            }
            if name != key {
                if let Some(first) = owners.get(&name) {
                    return Err(ConfigError::ConflictingType {
                        name,
                        first: first.clone(),
                        second: key,
                    });
                }
                owners.insert(name.clone(), key.clone());
            }

            settings.insert("name".to_string(), Value::String(name));
        }
        Ok(())
    }
}
