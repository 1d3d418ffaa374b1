//! Raw (unprocessed) schema configuration
//!
//! A [`RawConfig`] is the mutable table of type declarations for one schema
//! alias, as produced by config sources and threaded through the processor
//! pipeline. Its shape is a contract with the config sources:
//!
//! ```json
//! {
//!   "User": {
//!     "type": "object",
//!     "config": {
//!       "fields": {
//!         "username": "String!",
//!         "email": { "type": "String", "public": ["internal"] }
//!       }
//!     }
//!   }
//! }
//! ```

use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Declaration kinds understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclaredKind {
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    CustomScalar,
    RelayConnection,
}

impl DeclaredKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "object" => Some(Self::Object),
            "interface" => Some(Self::Interface),
            "union" => Some(Self::Union),
            "enum" => Some(Self::Enum),
            "input-object" => Some(Self::InputObject),
            "custom-scalar" => Some(Self::CustomScalar),
            "relay-connection" => Some(Self::RelayConnection),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Interface => "interface",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::InputObject => "input-object",
            Self::CustomScalar => "custom-scalar",
            Self::RelayConnection => "relay-connection",
        }
    }

    /// Kinds that declare a `fields` table
    pub fn has_fields(&self) -> bool {
        matches!(self, Self::Object | Self::Interface | Self::InputObject)
    }

    /// Kinds usable as argument or input field types
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Enum | Self::InputObject | Self::CustomScalar)
    }

    /// Kinds usable as object or interface field types
    pub fn is_output(&self) -> bool {
        !matches!(self, Self::InputObject)
    }
}

/// One alias's type declarations plus the processors already applied to them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawConfig {
    alias: String,
    types: Map<String, Value>,
    applied: Vec<&'static str>,
}

impl RawConfig {
    /// Create an empty configuration for an alias
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            types: Map::new(),
            applied: Vec::new(),
        }
    }

    /// Build a configuration from a JSON object keyed by type name
    pub fn from_value(alias: impl Into<String>, value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(types) => Ok(Self {
                alias: alias.into(),
                types,
                applied: Vec::new(),
            }),
            other => Err(ConfigError::InvalidValue {
                path: "<root>".to_string(),
                message: format!("expected a table of types, got {}", json_kind(&other)),
            }),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn types(&self) -> &Map<String, Value> {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.types
    }

    pub fn into_types(self) -> Map<String, Value> {
        self.types
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.types.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.types.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declare a new type, rejecting redeclarations
    pub fn insert(&mut self, key: impl Into<String>, declaration: Value) -> Result<(), ConfigError> {
        let key = key.into();
        if self.types.contains_key(&key) {
            return Err(ConfigError::DuplicateType(key));
        }
        self.types.insert(key, declaration);
        Ok(())
    }

    /// Merge another table of declarations into this one
    pub fn merge(&mut self, types: Map<String, Value>) -> Result<(), ConfigError> {
        if let Some(key) = types.keys().find(|k| self.types.contains_key(*k)) {
            return Err(ConfigError::DuplicateType(key.clone()));
        }
        self.types.extend(types);
        Ok(())
    }

    /// Processor names applied so far, in order
    pub fn applied(&self) -> &[&'static str] {
        &self.applied
    }

    pub fn is_applied(&self, processor: &str) -> bool {
        self.applied.iter().any(|p| *p == processor)
    }

    pub(crate) fn mark_applied(&mut self, processor: &'static str) {
        self.applied.push(processor);
    }
}

/// Read the declared kind of a type declaration
pub fn declared_kind(key: &str, declaration: &Value) -> Result<DeclaredKind, ConfigError> {
    let kind = declaration
        .get("type")
        .ok_or_else(|| missing(key, "type"))?
        .as_str()
        .ok_or_else(|| ConfigError::InvalidValue {
            path: format!("{}.type", key),
            message: "expected a string".to_string(),
        })?;
    DeclaredKind::parse(kind).ok_or_else(|| ConfigError::UnknownKind {
        type_name: key.to_string(),
        kind: kind.to_string(),
    })
}

/// The `config` table of a declaration
pub fn config_of<'a>(key: &str, declaration: &'a Value) -> Result<&'a Map<String, Value>, ConfigError> {
    match declaration.get("config") {
        Some(Value::Object(config)) => Ok(config),
        Some(other) => Err(not_a_table(&format!("{}.config", key), other)),
        None => Err(missing(key, "config")),
    }
}

/// The mutable `config` table of a declaration
pub fn config_of_mut<'a>(
    key: &str,
    declaration: &'a mut Value,
) -> Result<&'a mut Map<String, Value>, ConfigError> {
    match declaration.get_mut("config") {
        Some(Value::Object(config)) => Ok(config),
        Some(other) => Err(not_a_table(&format!("{}.config", key), other)),
        None => Err(missing(key, "config")),
    }
}

/// The declared GraphQL name, falling back to the key
pub fn graphql_name<'a>(key: &'a str, declaration: &'a Value) -> &'a str {
    declaration
        .get("config")
        .and_then(|c| c.get("name"))
        .and_then(Value::as_str)
        .unwrap_or(key)
}

/// Read an optional list of strings (`inherits`, `interfaces`, `types`)
pub fn string_list(path: &str, value: Option<&Value>) -> Result<Vec<String>, ConfigError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| ConfigError::InvalidValue {
                    path: path.to_string(),
                    message: "expected a list of type names".to_string(),
                })
            })
            .collect(),
        Some(other) => Err(ConfigError::InvalidValue {
            path: path.to_string(),
            message: format!("expected a list of type names, got {}", json_kind(other)),
        }),
    }
}

pub(crate) fn missing(type_name: &str, key: &str) -> ConfigError {
    ConfigError::MissingKey {
        type_name: type_name.to_string(),
        key: key.to_string(),
    }
}

pub(crate) fn not_a_table(path: &str, value: &Value) -> ConfigError {
    ConfigError::InvalidValue {
        path: path.to_string(),
        message: format!("expected a table, got {}", json_kind(value)),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a table",
    }
}
