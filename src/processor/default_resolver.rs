//! Default field resolver injection

use serde_json::Value;

use super::{fields_mut, ConfigProcessor};
use crate::error::ConfigError;
use crate::raw::{self, DeclaredKind, RawConfig};

/// Gives every object field without `resolve` the default resolver
pub struct DefaultResolverProcessor {
    resolver: String,
}

impl DefaultResolverProcessor {
    pub fn new(resolver: impl Into<String>) -> Self {
        Self {
            resolver: resolver.into(),
        }
    }
}

impl ConfigProcessor for DefaultResolverProcessor {
    fn name(&self) -> &'static str {
        "default-resolver"
    }

    fn apply(&self, config: &mut RawConfig) -> Result<(), ConfigError> {
        for key in config.keys() {
            let Some(declaration) = config.get_mut(&key) else {
                continue;
            };
            if raw::declared_kind(&key, declaration)? != DeclaredKind::Object {
                continue;
            }
            let fields = fields_mut(&key, raw::config_of_mut(&key, declaration)?)?;
            for (name, field) in fields.iter_mut() {
                let Value::Object(field) = field else {
                    continue;
                };
                match field.get("resolve") {
                    None | Some(Value::Null) => {
                        field.insert("resolve".to_string(), Value::String(self.resolver.clone()));
                    }
                    Some(Value::String(_)) => {}
                    Some(other) => {
                        return Err(ConfigError::InvalidValue {
                            path: format!("{}.{}.resolve", key, name),
                            message: format!("expected a resolver name, got {}", raw::json_kind(other)),
                        })
                    }
                }
            }
        }
        Ok(())
    }
}
