//! Error types for schema configuration, resolution and execution

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Structural problems found in a raw configuration by a processor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Type \"{type_name}\" is missing required key \"{key}\"")]
    MissingKey { type_name: String, key: String },

    #[error("Invalid value at {path}: {message}")]
    InvalidValue { path: String, message: String },

    #[error("Type \"{type_name}\" has unknown kind \"{kind}\"")]
    UnknownKind { type_name: String, kind: String },

    #[error("Type \"{0}\" is declared more than once")]
    DuplicateType(String),

    #[error("Type name \"{name}\" is declared by both \"{first}\" and \"{second}\"")]
    ConflictingType {
        name: String,
        first: String,
        second: String,
    },

    #[error(
        "Unknown type \"{reference}\" referenced at {path}{}",
        .suggestion.as_ref().map(|s| format!(" (did you mean \"{}\"?)", s)).unwrap_or_default()
    )]
    UnknownReference {
        path: String,
        reference: String,
        suggestion: Option<String>,
    },

    #[error("Type \"{type_name}\" inherits from unknown type \"{parent}\"")]
    UnknownParent { type_name: String, parent: String },

    #[error("Inheritance cycle detected between: {}", .types.join(", "))]
    InheritanceCycle { types: Vec<String> },

    #[error("Malformed type reference \"{type_ref}\" at {path}")]
    MalformedTypeRef { path: String, type_ref: String },

    #[error("Invalid GraphQL name \"{0}\"")]
    InvalidName(String),

    #[error("Type \"{0}\" has no fields left")]
    EmptyFields(String),

    #[error("Type \"{reference}\" cannot be used at {path}: expected {expected}")]
    InvalidKindReference {
        path: String,
        reference: String,
        expected: &'static str,
    },

    #[error("Processor \"{0}\" has already been applied to this configuration")]
    AlreadyProcessed(&'static str),
}

/// Schema registry errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema \"{alias}\" failed in processor \"{processor}\": {source}")]
    Config {
        alias: String,
        processor: &'static str,
        #[source]
        source: ConfigError,
    },

    #[error("Schema \"{alias}\" configuration is invalid: {source}")]
    Source {
        alias: String,
        #[source]
        source: ConfigError,
    },

    #[error("Mapping file {}: {source}", .path.display())]
    Mapping {
        path: std::path::PathBuf,
        #[source]
        source: ConfigError,
    },

    /// The wording is relied upon by callers, keep it stable.
    #[error("Type loader is expected to return valid type \"{0}\", but it returned null")]
    UnknownType(String),

    #[error("Unknown schema alias \"{0}\"")]
    SchemaNotFound(String),

    #[error("Schema alias \"{0}\" is registered more than once")]
    DuplicateAlias(String),

    #[error("No schema is registered")]
    NoSchemas,

    #[error("Schema \"{alias}\" is unavailable: {reason}")]
    SchemaUnavailable { alias: String, reason: String },

    #[error("Field \"{type_name}.{field}\" uses unknown resolver \"{resolver}\"")]
    UnknownResolver {
        type_name: String,
        field: String,
        resolver: String,
    },

    #[error("Schema \"{alias}\" has no {root} root type configured")]
    MissingRootType { alias: String, root: &'static str },

    #[error("Schema \"{alias}\" was rejected by the execution engine: {message}")]
    Build { alias: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config_crate::ConfigError),
}

/// Error returned by a field resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ResolveError(String);

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_message() {
        let err = SchemaError::UnknownType("unknown".to_string());
        assert_eq!(
            err.to_string(),
            "Type loader is expected to return valid type \"unknown\", but it returned null"
        );
    }

    #[test]
    fn test_unknown_reference_suggestion() {
        let err = ConfigError::UnknownReference {
            path: "Query.user".to_string(),
            reference: "Usr".to_string(),
            suggestion: Some("User".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Unknown type \"Usr\" referenced at Query.user (did you mean \"User\"?)"
        );

        let err = ConfigError::UnknownReference {
            path: "Query.user".to_string(),
            reference: "Zzz".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "Unknown type \"Zzz\" referenced at Query.user");
    }
}
