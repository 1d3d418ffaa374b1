//! Compiled schema
//!
//! One [`Schema`] per alias: the processed configuration lives in its own
//! [`TypeResolver`], and the types reachable from the roots are lowered into
//! the execution engine once, at build time.

use async_graphql::dynamic::Schema as EngineSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, info_span};

use crate::engine;
use crate::error::{Result, SchemaError};
use crate::executor::{ExecutionResult, GraphQLRequest};
use crate::processor::{Pipeline, PipelineOptions};
use crate::raw::RawConfig;
use crate::resolvers::ResolverMap;
use crate::type_resolver::TypeResolver;
use crate::types::{TypeDefinition, TypeKind};

/// Root types of one alias
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Query root, by key or GraphQL name
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<String>,
    /// Extra types to compile even if the roots never reference them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

impl SchemaDefinition {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn mutation(mut self, mutation: impl Into<String>) -> Self {
        self.mutation = Some(mutation.into());
        self
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.types.push(type_name.into());
        self
    }
}

/// The compiled, queryable schema of one alias
pub struct Schema {
    alias: String,
    types: TypeResolver,
    query: Arc<TypeDefinition>,
    mutation: Option<Arc<TypeDefinition>>,
    engine: EngineSchema,
}

impl Schema {
    /// Process `raw` with the standard pipeline and compile the result
    pub fn build(
        definition: &SchemaDefinition,
        mut raw: RawConfig,
        options: &PipelineOptions,
        resolvers: &ResolverMap,
    ) -> Result<Self> {
        let alias = raw.alias().to_string();
        let span = info_span!("schema", alias = %alias);
        let _enter = span.enter();

        Pipeline::standard(options).run(&mut raw)?;
        let types = TypeResolver::new(raw);

        let query = root(&types, &alias, "query", Some(&definition.query))?
            .ok_or_else(|| SchemaError::MissingRootType {
                alias: alias.clone(),
                root: "query",
            })?;
        let mutation = root(&types, &alias, "mutation", definition.mutation.as_ref())?;
        for type_name in &definition.types {
            types.resolve(type_name)?;
        }
        resolve_implementations(&types)?;

        let engine = engine::lower(
            &types,
            resolvers,
            &query.name,
            mutation.as_ref().map(|m| m.name.as_str()),
        )?;
        info!(types = types.resolved_types().len(), query = %query.name, "schema built");

        Ok(Self {
            alias,
            types,
            query,
            mutation,
            engine,
        })
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Look up a type by key or GraphQL name
    pub fn get_type(&self, name: &str) -> Result<Arc<TypeDefinition>> {
        self.types.resolve(name)
    }

    pub fn query_type(&self) -> &Arc<TypeDefinition> {
        &self.query
    }

    pub fn mutation_type(&self) -> Option<&Arc<TypeDefinition>> {
        self.mutation.as_ref()
    }

    pub fn type_resolver(&self) -> &TypeResolver {
        &self.types
    }

    /// Schema definition language of the lowered schema
    pub fn sdl(&self) -> String {
        self.engine.sdl()
    }

    /// Execute one request against this schema
    pub async fn execute(&self, request: GraphQLRequest) -> ExecutionResult {
        debug!(alias = %self.alias, operation = ?request.operation_name, "executing request");
        engine::execute(&self.engine, request).await
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("alias", &self.alias)
            .field("query", &self.query.name)
            .field("mutation", &self.mutation.as_ref().map(|m| &m.name))
            .finish()
    }
}

fn root(
    types: &TypeResolver,
    alias: &str,
    root: &'static str,
    name: Option<&String>,
) -> Result<Option<Arc<TypeDefinition>>> {
    let Some(name) = name.filter(|name| !name.is_empty()) else {
        return Ok(None);
    };
    if !types.contains(name) {
        return Err(SchemaError::MissingRootType {
            alias: alias.to_string(),
            root,
        });
    }
    let definition = types.resolve(name)?;
    match definition.kind {
        TypeKind::Object { .. } => Ok(Some(definition)),
        _ => Err(SchemaError::Build {
            alias: alias.to_string(),
            message: format!("{} root \"{}\" must be an object type", root, definition.name),
        }),
    }
}

/// Objects implementing a compiled interface are only reachable through it
fn resolve_implementations(types: &TypeResolver) -> Result<()> {
    let mut visited = HashSet::new();
    loop {
        let pending: Vec<String> = types
            .resolved_types()
            .iter()
            .filter(|definition| matches!(definition.kind, TypeKind::Interface { .. }))
            .filter(|definition| visited.insert(definition.id))
            .flat_map(|definition| types.implementations(&definition.key))
            .map(str::to_string)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        for key in pending {
            types.resolve(&key)?;
        }
    }
}
