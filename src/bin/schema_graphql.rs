//! GraphQL Schema CLI
//!
//! Builds every configured alias and inspects or queries the result.
//!
//! Field resolvers can't be loaded from a config file, so the CLI answers
//! each named resolver with a static JSON value taken from `--data`
//! (`{"resolverName": value}`); resolvers missing there return null.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use graphql_schemas::{
    source, GraphQLConfig, GraphQLRequest, RequestExecutor, ResolveError, ResolveInfo, ResolverMap,
    SchemaRegistry,
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-graphql")]
#[command(about = "Build, inspect and query per-alias GraphQL schemas")]
struct Cli {
    /// Configuration file (graphql.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file mapping resolver names to the values they return
    #[arg(short, long)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every alias and report failures
    Validate,

    /// List the compiled types of an alias
    Types {
        alias: String,
    },

    /// Print the SDL of an alias
    Sdl {
        alias: String,
    },

    /// Execute a query against an alias
    Query {
        alias: String,
        query: String,
        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,
        /// Operation to run when the document holds several
        #[arg(long)]
        operation: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = GraphQLConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if let Some(base) = cli.config.as_deref().and_then(Path::parent) {
        config = config.with_base_dir(base);
    }

    let resolvers = static_resolvers(&config, cli.data.as_deref())?;
    let registry = Arc::new(SchemaRegistry::load(&config, resolvers)?);

    match cli.command {
        Commands::Validate => {
            if registry.is_empty() {
                bail!("no schema configured");
            }
            let mut failed = 0;
            for alias in registry.aliases() {
                match registry.failure(alias) {
                    None => println!("✅ {}", alias),
                    Some(reason) => {
                        println!("❌ {}: {}", alias, reason);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} schema(s) failed to build", failed, registry.len());
            }
        }

        Commands::Types { alias } => {
            let schema = registry.get_schema(&alias)?;
            for definition in schema.type_resolver().resolved_types() {
                if definition.is_builtin() {
                    continue;
                }
                if definition.key == definition.name {
                    println!("{:<14} {}", definition.kind_name(), definition.name);
                } else {
                    println!("{:<14} {} ({})", definition.kind_name(), definition.name, definition.key);
                }
            }
        }

        Commands::Sdl { alias } => {
            println!("{}", registry.get_schema(&alias)?.sdl());
        }

        Commands::Query {
            alias,
            query,
            variables,
            operation,
        } => {
            let mut request = GraphQLRequest::new(query);
            if let Some(variables) = variables {
                request = request.variables(serde_json::from_str(&variables).context("parsing --variables")?);
            }
            if let Some(operation) = operation {
                request = request.operation_name(operation);
            }

            let executor = RequestExecutor::new(registry);
            let result = executor.execute(Some(&alias), request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_ok() {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

/// One resolver per name referenced by the mappings or configured as the
/// default field resolver, answering from `--data`
fn static_resolvers(config: &GraphQLConfig, data: Option<&Path>) -> anyhow::Result<ResolverMap> {
    let data: Map<String, Value> = match data {
        Some(path) => {
            let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
        }
        None => Map::new(),
    };

    let definitions = &config.definitions;
    let mut names = BTreeSet::from([definitions.default_field_resolver.clone()]);
    let dirs = definitions
        .mappings
        .iter()
        .chain(definitions.schema.values().flat_map(|schema| schema.mappings.iter()));
    for dir in dirs {
        for declaration in source::load_mappings(std::slice::from_ref(dir))?.values() {
            collect_resolver_names(declaration, &mut names);
        }
    }

    let mut resolvers = ResolverMap::new();
    for name in names {
        if resolvers.contains(&name) {
            continue;
        }
        let value = data.get(&name).cloned().unwrap_or(Value::Null);
        resolvers.insert(name, move |_: &ResolveInfo<'_>| -> Result<Value, ResolveError> { Ok(value.clone()) });
    }
    Ok(resolvers)
}

fn collect_resolver_names(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                match (key.as_str(), value) {
                    ("resolve", Value::String(name)) => {
                        names.insert(name.clone());
                    }
                    _ => collect_resolver_names(value, names),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_resolver_names(item, names)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_resolvers_cover_default_field_resolver() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("mappings")).unwrap();
        std::fs::write(
            dir.path().join("mappings/query.json"),
            r#"{"Query": {"type": "object", "config": {"fields": {
                "hello": {"type": "String", "resolve": "hello"},
                "name": "String"
            }}}}"#,
        )
        .unwrap();

        let config = GraphQLConfig::from_toml(
            r#"
[definitions]
default_field_resolver = "field"

[definitions.schema.public]
query = "Query"
mappings = ["mappings"]
"#,
        )
        .unwrap()
        .with_base_dir(dir.path());

        let resolvers = static_resolvers(&config, None).unwrap();
        assert!(resolvers.contains("field"));
        assert!(resolvers.contains("hello"));

        let registry = SchemaRegistry::load(&config, resolvers).unwrap();
        assert!(registry.failure("public").is_none(), "{:?}", registry.failure("public"));
    }
}

