//! Schema Registry
//!
//! Holds one independently built [`Schema`] per alias. Every alias owns its
//! raw configuration, pipeline run, type resolver and compiled schema; the
//! only shared piece is the immutable [`ResolverMap`].
//!
//! A failed alias is recorded with its reason and never blocks the others.
//! Requests for it fail with [`SchemaError::SchemaUnavailable`] until a
//! [`reload`](SchemaRegistry::reload) succeeds.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::GraphQLConfig;
use crate::error::{ConfigError, Result, SchemaError};
use crate::processor::PipelineOptions;
use crate::raw::RawConfig;
use crate::resolvers::ResolverMap;
use crate::schema::{Schema, SchemaDefinition};
use crate::source;
use crate::types::TypeDefinition;

/// What an alias is built from, kept for reloads
struct AliasSource {
    definition: SchemaDefinition,
    raw: RawConfig,
}

#[derive(Clone)]
enum AliasState {
    Ready(Arc<Schema>),
    Failed(String),
}

/// Alias -> compiled schema
pub struct SchemaRegistry {
    resolvers: ResolverMap,
    options: PipelineOptions,
    default_alias: Option<String>,
    /// Registration order
    aliases: Vec<String>,
    sources: HashMap<String, AliasSource>,
    states: RwLock<HashMap<String, AliasState>>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Build every alias declared in `config`, reading their mapping directories
    ///
    /// Unreadable shared mappings fail the whole load. Anything wrong with one
    /// alias's own configuration only fails that alias.
    pub fn load(config: &GraphQLConfig, resolvers: ResolverMap) -> Result<Self> {
        let definitions = &config.definitions;
        let shared = source::load_mappings(&definitions.mappings[..])?;

        let mut builder = Self::builder()
            .resolvers(resolvers)
            .options(config.pipeline_options());
        if let Some(default_alias) = &definitions.default_schema {
            builder = builder.default_alias(default_alias.clone());
        }
        for (alias, schema) in &definitions.schema {
            builder = match alias_config(alias, &shared, &schema.mappings) {
                Ok(raw) => builder.schema(schema.definition(), raw),
                Err(e) => builder.failed(alias.clone(), e.to_string()),
            };
        }
        builder.build()
    }

    /// The compiled schema of `alias`
    pub fn get_schema(&self, alias: &str) -> Result<Arc<Schema>> {
        match self.states.read().get(alias) {
            Some(AliasState::Ready(schema)) => Ok(Arc::clone(schema)),
            Some(AliasState::Failed(reason)) => Err(SchemaError::SchemaUnavailable {
                alias: alias.to_string(),
                reason: reason.clone(),
            }),
            None => Err(SchemaError::SchemaNotFound(alias.to_string())),
        }
    }

    /// The compiled schema of the default alias
    pub fn get_default_schema(&self) -> Result<Arc<Schema>> {
        let alias = self.default_alias.as_deref().ok_or(SchemaError::NoSchemas)?;
        self.get_schema(alias)
    }

    /// Resolve a type by key or GraphQL name within one alias
    pub fn resolve_type_name(&self, alias: &str, type_name: &str) -> Result<Arc<TypeDefinition>> {
        self.get_schema(alias)?.get_type(type_name)
    }

    /// Rebuild one alias from its retained source configuration
    ///
    /// Aliases whose configuration could not be assembled have nothing to
    /// rebuild from and stay unavailable.
    pub fn reload(&self, alias: &str) -> Result<Arc<Schema>> {
        let Some(source) = self.sources.get(alias) else {
            return self.get_schema(alias);
        };
        let built = Schema::build(&source.definition, source.raw.clone(), &self.options, &self.resolvers);

        let state = match built {
            Ok(schema) => {
                info!(alias, "schema reloaded");
                AliasState::Ready(Arc::new(schema))
            }
            Err(e) => {
                error!(alias, error = %e, "schema reload failed");
                AliasState::Failed(e.to_string())
            }
        };
        self.states.write().insert(alias.to_string(), state);
        self.get_schema(alias)
    }

    /// Registered aliases, in registration order
    pub fn aliases(&self) -> Vec<&str> {
        self.aliases.iter().map(String::as_str).collect()
    }

    pub fn default_alias(&self) -> Option<&str> {
        self.default_alias.as_deref()
    }

    /// Why `alias` failed to build, if it did
    pub fn failure(&self, alias: &str) -> Option<String> {
        match self.states.read().get(alias) {
            Some(AliasState::Failed(reason)) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn resolvers(&self) -> &ResolverMap {
        &self.resolvers
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed: Vec<&str> = self
            .aliases
            .iter()
            .filter(|alias| self.failure(alias).is_some())
            .map(String::as_str)
            .collect();
        f.debug_struct("SchemaRegistry")
            .field("aliases", &self.aliases)
            .field("default_alias", &self.default_alias)
            .field("failed", &failed)
            .finish()
    }
}

/// Shared declarations plus the alias's own mapping directories
fn alias_config(alias: &str, shared: &Map<String, Value>, mappings: &[PathBuf]) -> Result<RawConfig> {
    let invalid = |source: ConfigError| SchemaError::Source {
        alias: alias.to_string(),
        source,
    };
    let mut raw = RawConfig::new(alias);
    raw.merge(shared.clone()).map_err(invalid)?;
    raw.merge(source::load_mappings(mappings)?).map_err(invalid)?;
    Ok(raw)
}

/// Collects aliases, then builds them one after another
#[derive(Default)]
pub struct SchemaRegistryBuilder {
    resolvers: ResolverMap,
    options: PipelineOptions,
    default_alias: Option<String>,
    /// alias -> source, or the reason it could not be assembled
    schemas: Vec<(String, std::result::Result<AliasSource, String>)>,
}

impl SchemaRegistryBuilder {
    pub fn resolvers(mut self, resolvers: ResolverMap) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Alias used when a request names none; defaults to the first registered
    pub fn default_alias(mut self, alias: impl Into<String>) -> Self {
        self.default_alias = Some(alias.into());
        self
    }

    /// Register an alias; the alias name is taken from `raw`
    pub fn schema(mut self, definition: SchemaDefinition, raw: RawConfig) -> Self {
        let alias = raw.alias().to_string();
        self.schemas.push((alias, Ok(AliasSource { definition, raw })));
        self
    }

    /// Register an alias whose configuration could not be assembled
    pub fn failed(mut self, alias: impl Into<String>, reason: impl Into<String>) -> Self {
        self.schemas.push((alias.into(), Err(reason.into())));
        self
    }

    /// Build every alias
    ///
    /// Only registration mistakes fail here. Schema build failures are
    /// recorded per alias.
    pub fn build(self) -> Result<SchemaRegistry> {
        let mut aliases: Vec<String> = Vec::with_capacity(self.schemas.len());
        let mut sources = HashMap::with_capacity(self.schemas.len());
        let mut states = HashMap::with_capacity(self.schemas.len());
        for (alias, source) in self.schemas {
            if aliases.contains(&alias) {
                return Err(SchemaError::DuplicateAlias(alias));
            }
            aliases.push(alias.clone());
            match source {
                Ok(source) => {
                    sources.insert(alias, source);
                }
                Err(reason) => {
                    error!(alias = %alias, error = %reason, "schema configuration failed");
                    states.insert(alias, AliasState::Failed(reason));
                }
            }
        }

        let default_alias = match self.default_alias {
            Some(alias) if !aliases.contains(&alias) => return Err(SchemaError::SchemaNotFound(alias)),
            Some(alias) => Some(alias),
            None => aliases.first().cloned(),
        };

        for alias in &aliases {
            let Some(source) = sources.get(alias) else {
                continue;
            };
            let state = match Schema::build(&source.definition, source.raw.clone(), &self.options, &self.resolvers) {
                Ok(schema) => AliasState::Ready(Arc::new(schema)),
                Err(e) => {
                    error!(alias = %alias, error = %e, "schema build failed");
                    AliasState::Failed(e.to_string())
                }
            };
            states.insert(alias.clone(), state);
        }
        info!(
            aliases = aliases.len(),
            failed = states.values().filter(|s| matches!(s, AliasState::Failed(_))).count(),
            "schema registry built"
        );

        Ok(SchemaRegistry {
            resolvers: self.resolvers,
            options: self.options,
            default_alias,
            aliases,
            sources,
            states: RwLock::new(states),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn raw(alias: &str, value: Value) -> RawConfig {
        RawConfig::from_value(alias, value).unwrap()
    }

    fn user_schema(alias: &str, user_fields: Value) -> RawConfig {
        raw(
            alias,
            json!({
                "User": {"type": "object", "config": {"fields": user_fields}},
                "Query": {"type": "object", "config": {"fields": {"me": "User"}}}
            }),
        )
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .schema(SchemaDefinition::new("Query"), user_schema("public", json!({"username": "String!"})))
            .schema(
                SchemaDefinition::new("Query"),
                user_schema("internal", json!({"username": "String!", "email": "String"})),
            )
            .schema(
                SchemaDefinition::new("Query"),
                raw("broken", json!({"Query": {"type": "object", "config": {"fields": {"me": "Missing"}}}})),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_aliases_are_isolated() {
        let registry = registry();
        let public = registry.resolve_type_name("public", "User").unwrap();
        let internal = registry.resolve_type_name("internal", "User").unwrap();
        assert_eq!(public.field_names(), vec!["username"]);
        assert_eq!(internal.field_names(), vec!["username", "email"]);
        assert!(!Arc::ptr_eq(&public, &internal));
    }

    #[test]
    fn test_failed_alias_does_not_block_others() {
        let registry = registry();
        assert_eq!(registry.aliases(), vec!["public", "internal", "broken"]);
        assert!(registry.get_schema("public").is_ok());

        let err = registry.get_schema("broken").unwrap_err();
        assert!(matches!(err, SchemaError::SchemaUnavailable { ref alias, .. } if alias == "broken"));
        assert!(registry.failure("broken").unwrap().contains("Missing"));
        assert!(registry.failure("public").is_none());
    }

    #[test]
    fn test_unknown_alias() {
        let err = registry().get_schema("private").unwrap_err();
        assert_eq!(err.to_string(), "Unknown schema alias \"private\"");
    }

    #[test]
    fn test_default_alias() {
        let registry = registry();
        assert_eq!(registry.default_alias(), Some("public"));
        assert_eq!(registry.get_default_schema().unwrap().alias(), "public");

        let registry = SchemaRegistry::builder()
            .default_alias("internal")
            .schema(SchemaDefinition::new("Query"), user_schema("internal", json!({"id": "ID"})))
            .build()
            .unwrap();
        assert_eq!(registry.get_default_schema().unwrap().alias(), "internal");

        assert!(matches!(
            SchemaRegistry::builder().build().unwrap().get_default_schema(),
            Err(SchemaError::NoSchemas)
        ));
    }

    #[test]
    fn test_registration_mistakes() {
        let err = SchemaRegistry::builder()
            .schema(SchemaDefinition::new("Query"), user_schema("public", json!({"id": "ID"})))
            .schema(SchemaDefinition::new("Query"), user_schema("public", json!({"id": "ID"})))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateAlias(alias) if alias == "public"));

        let err = SchemaRegistry::builder()
            .default_alias("internal")
            .schema(SchemaDefinition::new("Query"), user_schema("public", json!({"id": "ID"})))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::SchemaNotFound(alias) if alias == "internal"));
    }

    #[test]
    fn test_reload_rebuilds_from_source() {
        let registry = registry();
        let before = registry.get_schema("public").unwrap();
        let after = registry.reload("public").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.get_type("User").unwrap().field_names(), vec!["username"]);

        assert!(registry.reload("broken").is_err());
        assert!(registry.failure("broken").is_some());
        assert!(matches!(registry.reload("private"), Err(SchemaError::SchemaNotFound(_))));
    }

    #[test]
    fn test_load_isolates_alias_configuration_errors() {
        let dir = tempfile::tempdir().unwrap();
        let write = |path: &str, content: &str| {
            let path = dir.path().join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        };
        write(
            "shared/user.json",
            r#"{"User": {"type": "object", "config": {"fields": {"username": "String!"}}}}"#,
        );
        write(
            "public/query.json",
            r#"{"Query": {"type": "object", "config": {"fields": {"me": "User"}}}}"#,
        );
        write(
            "internal/user.json",
            r#"{"User": {"type": "object", "config": {"fields": {"email": "String"}}}}"#,
        );
        write("malformed/query.json", "{not json");

        let config = GraphQLConfig::from_toml(
            r#"
[definitions]
mappings = ["shared"]

[definitions.schema.public]
query = "Query"
mappings = ["public"]

[definitions.schema.internal]
query = "Query"
mappings = ["internal", "public"]

[definitions.schema.malformed]
query = "Query"
mappings = ["malformed"]
"#,
        )
        .unwrap()
        .with_base_dir(dir.path());

        let registry = SchemaRegistry::load(&config, ResolverMap::new()).unwrap();
        assert_eq!(registry.len(), 3);

        let public = registry.get_schema("public").unwrap();
        assert_eq!(public.get_type("User").unwrap().field_names(), vec!["username"]);

        let err = registry.get_schema("internal").unwrap_err();
        assert!(matches!(err, SchemaError::SchemaUnavailable { ref alias, .. } if alias == "internal"));
        assert!(err.to_string().contains("declared more than once"), "{}", err);

        assert!(matches!(
            registry.get_schema("malformed"),
            Err(SchemaError::SchemaUnavailable { .. })
        ));
        assert!(matches!(
            registry.reload("malformed"),
            Err(SchemaError::SchemaUnavailable { .. })
        ));
    }

    #[test]
    fn test_load_fails_on_unreadable_shared_mappings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "[1, 2]").unwrap();

        let mut config = GraphQLConfig::default();
        config.definitions.mappings.push(dir.path().to_path_buf());
        let err = SchemaRegistry::load(&config, ResolverMap::new()).unwrap_err();
        assert!(matches!(err, SchemaError::Mapping { .. }), "{}", err);
    }
}
