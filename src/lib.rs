//! GraphQL Schemas
//!
//! Turns declarative GraphQL type definitions into executable schemas, one
//! independently built schema per alias.
//!
//! ## Features
//!
//! - **Processor Pipeline**: ordered, exactly-once transformations over the raw type table
//! - **Lazy Type Resolution**: types compile on first access, cycles link by slot id
//! - **Multi-Schema Isolation**: aliases share nothing but the field resolver map
//! - **Dynamic Execution**: compiled types are lowered into `async-graphql`
//!
//! ## Architecture
//!
//! ```text
//! mappings/*.json|toml ─► RawConfig (per alias)
//!                            │
//!                            ▼
//!        relay-connection ─► shorthand ─► inheritance ─► named
//!          ─► visibility ─► deprecation ─► default-resolver ─► references
//!                            │
//!                            ▼
//!                     TypeResolver ─► Schema ─► SchemaRegistry ─► RequestExecutor
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod processor;
pub mod raw;
pub mod registry;
pub mod resolvers;
pub mod schema;
pub mod source;
pub mod type_ref;
pub mod type_resolver;
pub mod types;

pub use config::GraphQLConfig;
pub use error::{ConfigError, ResolveError, Result, SchemaError};
pub use executor::{ExecutionError, ExecutionResult, GraphQLRequest, RequestExecutor};
pub use processor::{ConfigProcessor, Pipeline, PipelineOptions};
pub use raw::RawConfig;
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};
pub use resolvers::{FieldResolver, ResolveInfo, ResolverMap};
pub use schema::{Schema, SchemaDefinition};
pub use type_resolver::TypeResolver;
pub use types::{TypeDefinition, TypeId, TypeKind};
