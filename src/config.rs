//! Configuration management for GraphQL schemas
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (graphql.toml)
//! - Environment variables (GRAPHQL__*)
//!
//! ## Example config file (graphql.toml):
//! ```toml
//! [definitions]
//! default_schema = "public"
//! default_field_resolver = "property"
//! mappings = ["config/graphql/shared"]
//!
//! [definitions.schema.public]
//! query = "PublicQuery"
//! mutation = "Mutation"
//! mappings = ["config/graphql/public"]
//!
//! [definitions.schema.internal]
//! query = "InternalQuery"
//! mutation = "Mutation"
//! mappings = ["config/graphql/internal"]
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::processor::PipelineOptions;
use crate::resolvers::PROPERTY_RESOLVER;
use crate::schema::SchemaDefinition;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphQLConfig {
    #[serde(default)]
    pub definitions: DefinitionsConfig,
}

/// Schema definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionsConfig {
    /// Alias used when a request names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,

    /// Resolver given to object fields without `resolve`
    #[serde(default = "default_field_resolver")]
    pub default_field_resolver: String,

    /// Mapping directories shared by every alias
    #[serde(default)]
    pub mappings: Vec<PathBuf>,

    /// Per-alias schemas
    #[serde(default)]
    pub schema: BTreeMap<String, SchemaConfig>,
}

/// One alias
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Query root type
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<String>,

    /// Types compiled even when unreachable from the roots
    #[serde(default)]
    pub types: Vec<String>,

    /// Mapping directories for this alias only
    #[serde(default)]
    pub mappings: Vec<PathBuf>,
}

fn default_field_resolver() -> String {
    PROPERTY_RESOLVER.to_string()
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            default_schema: None,
            default_field_resolver: default_field_resolver(),
            mappings: Vec::new(),
            schema: BTreeMap::new(),
        }
    }
}

impl SchemaConfig {
    pub fn definition(&self) -> SchemaDefinition {
        SchemaDefinition {
            query: self.query.clone(),
            mutation: self.mutation.clone(),
            types: self.types.clone(),
        }
    }
}

impl GraphQLConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        for location in ["graphql.toml", ".graphql.toml", "config/graphql.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "graphql", "schemas") {
            let user_config = dirs.config_dir().join("graphql.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("GRAPHQL")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            default_field_resolver: self.definitions.default_field_resolver.clone(),
        }
    }

    /// Resolve relative mapping directories against `base`
    pub fn with_base_dir(mut self, base: &Path) -> Self {
        let rebase = |paths: &mut Vec<PathBuf>| {
            for path in paths.iter_mut().filter(|p| p.is_relative()) {
                *path = base.join(&*path);
            }
        };
        rebase(&mut self.definitions.mappings);
        for schema in self.definitions.schema.values_mut() {
            rebase(&mut schema.mappings);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
[definitions]
default_schema = "public"
mappings = ["shared"]

[definitions.schema.public]
query = "PublicQuery"
mutation = "Mutation"
mappings = ["public"]

[definitions.schema.internal]
query = "InternalQuery"
types = ["User"]
"#;

    #[test]
    fn test_default_config() {
        let config = GraphQLConfig::default();
        assert_eq!(config.definitions.default_field_resolver, "property");
        assert!(config.definitions.schema.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let config = GraphQLConfig::from_toml(EXAMPLE).unwrap();
        assert_eq!(config.definitions.default_schema.as_deref(), Some("public"));
        assert_eq!(config.definitions.default_field_resolver, "property");

        let public = &config.definitions.schema["public"];
        assert_eq!(
            public.definition(),
            SchemaDefinition::new("PublicQuery").mutation("Mutation")
        );
        let internal = &config.definitions.schema["internal"];
        assert_eq!(internal.definition().types, vec!["User"]);
    }

    #[test]
    fn test_base_dir() {
        let config = GraphQLConfig::from_toml(EXAMPLE).unwrap().with_base_dir(Path::new("/srv/app"));
        assert_eq!(config.definitions.mappings, vec![PathBuf::from("/srv/app/shared")]);
        assert_eq!(
            config.definitions.schema["public"].mappings,
            vec![PathBuf::from("/srv/app/public")]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphql.toml");
        GraphQLConfig::from_toml(EXAMPLE).unwrap().save(&path).unwrap();

        let loaded = GraphQLConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.definitions.schema.len(), 2);
        assert_eq!(loaded.definitions.schema["internal"].query, "InternalQuery");
    }
}
