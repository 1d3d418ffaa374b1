//! Lowering into the execution engine
//!
//! Compiled [`TypeDefinition`]s are registered with an `async_graphql`
//! dynamic schema. Each object field gets a [`FieldBinding`] holding the
//! named [`FieldResolver`] and the output shape of the field, computed once
//! at build time:
//!
//! - `null` results become GraphQL nulls,
//! - arrays are lowered item by item,
//! - enum results are mapped from their internal value to the enum name,
//! - interface and union results pick their concrete type from `__typename`.

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, ResolverContext, Scalar, Schema as EngineSchema, SchemaBuilder,
    TypeRef as EngineTypeRef, Union,
};
use async_graphql::{Name, PathSegment, Request, Value as GqlValue, Variables};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::error::{Result, SchemaError};
use crate::executor::{ExecutionError, ExecutionResult, GraphQLRequest};
use crate::resolvers::{FieldResolver, ResolveInfo, ResolverMap};
use crate::type_resolver::TypeResolver;
use crate::types::{
    EnumValueDefinition, FieldDefinition, InputValueDefinition, TypeDefinition, TypeKind, TypeRef,
};

/// Key read from abstract results to select the concrete type
pub const TYPENAME_KEY: &str = "__typename";

type FieldResult<'a> = std::result::Result<Option<FieldValue<'a>>, async_graphql::Error>;

/// How a resolver's JSON result is turned into an engine value
#[derive(Debug, Clone)]
enum OutputShape {
    Leaf,
    Enum(Vec<(Value, String)>),
    Object,
    Abstract,
    List(Box<OutputShape>),
}

impl OutputShape {
    fn of(ty: &TypeRef, types: &TypeResolver) -> Result<Self> {
        match ty {
            TypeRef::NonNull(inner) => Self::of(inner, types),
            TypeRef::List(inner) => Ok(Self::List(Box::new(Self::of(inner, types)?))),
            TypeRef::Named(named) => {
                let target = types
                    .get(named.id)
                    .ok_or_else(|| SchemaError::UnknownType(named.name.clone()))?;
                Ok(match &target.kind {
                    TypeKind::Scalar { .. } => Self::Leaf,
                    TypeKind::Enum { values } => Self::Enum(
                        values.iter().map(|v| (v.value.clone(), v.name.clone())).collect(),
                    ),
                    TypeKind::Object { .. } => Self::Object,
                    TypeKind::Interface { .. } | TypeKind::Union { .. } => Self::Abstract,
                    TypeKind::InputObject { .. } => {
                        return Err(SchemaError::Build {
                            alias: types.alias().to_string(),
                            message: format!("input type \"{}\" used as an output", target.name),
                        })
                    }
                })
            }
        }
    }

    fn lower<'a>(&self, value: Value) -> FieldResult<'a> {
        if value.is_null() {
            return Ok(None);
        }
        let lowered = match (self, value) {
            (Self::List(inner), Value::Array(items)) => {
                let items = items
                    .into_iter()
                    .map(|item| Ok(inner.lower(item)?.unwrap_or(FieldValue::NULL)))
                    .collect::<std::result::Result<Vec<_>, async_graphql::Error>>()?;
                FieldValue::list(items)
            }
            (Self::List(_), other) => {
                return Err(async_graphql::Error::new(format!("expected a list, got {}", other)))
            }
            (Self::Enum(values), value) => {
                let name = values
                    .iter()
                    .find(|(internal, _)| *internal == value)
                    .map(|(_, name)| name.clone())
                    .or_else(|| {
                        value
                            .as_str()
                            .filter(|s| values.iter().any(|(_, name)| name == s))
                            .map(str::to_string)
                    })
                    .ok_or_else(|| async_graphql::Error::new(format!("{} is not a valid enum value", value)))?;
                FieldValue::value(GqlValue::Enum(Name::new(name)))
            }
            (Self::Abstract, value) => {
                let concrete = value
                    .get(TYPENAME_KEY)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        async_graphql::Error::new(format!("abstract result is missing \"{}\"", TYPENAME_KEY))
                    })?;
                FieldValue::value(GqlValue::from_json(value)?).with_type(concrete)
            }
            (Self::Object | Self::Leaf, value) => FieldValue::value(GqlValue::from_json(value)?),
        };
        Ok(Some(lowered))
    }
}

/// One object field wired to its resolver
struct FieldBinding {
    alias: String,
    type_name: String,
    field_name: String,
    resolver: Arc<dyn FieldResolver>,
    shape: OutputShape,
}

impl FieldBinding {
    fn call<'a>(&self, ctx: &ResolverContext<'a>) -> FieldResult<'a> {
        let parent = match ctx.parent_value.as_value() {
            None | Some(GqlValue::Null) => None,
            Some(value) => Some(value.clone().into_json()?),
        };
        let args = ctx
            .args
            .iter()
            .map(|(name, value)| Ok((name.to_string(), value.as_value().clone().into_json()?)))
            .collect::<std::result::Result<Map<String, Value>, async_graphql::Error>>()?;

        trace!(alias = %self.alias, type_name = %self.type_name, field = %self.field_name, "resolving field");
        let info = ResolveInfo {
            alias: &self.alias,
            type_name: &self.type_name,
            field_name: &self.field_name,
            parent: parent.as_ref(),
            args: &args,
        };
        let value = self
            .resolver
            .resolve(&info)
            .map_err(|e| async_graphql::Error::new(e.message()))?;
        self.shape.lower(value)
    }
}

/// Register every resolved type with a new engine schema
pub(crate) fn lower(
    types: &TypeResolver,
    resolvers: &ResolverMap,
    query: &str,
    mutation: Option<&str>,
) -> Result<EngineSchema> {
    let alias = types.alias();
    let mut builder = EngineSchema::build(query, mutation, None);
    let mut registered = 0usize;

    for definition in types.resolved_types() {
        if definition.is_builtin() {
            continue;
        }
        builder = register(builder, &definition, types, resolvers)?;
        registered += 1;
    }

    debug!(alias, types = registered, "lowering schema");
    builder.finish().map_err(|e| SchemaError::Build {
        alias: alias.to_string(),
        message: e.to_string(),
    })
}

fn register(
    builder: SchemaBuilder,
    definition: &TypeDefinition,
    types: &TypeResolver,
    resolvers: &ResolverMap,
) -> Result<SchemaBuilder> {
    let name = definition.name.as_str();
    let description = definition.description.as_deref();

    Ok(match &definition.kind {
        TypeKind::Scalar { .. } => {
            let mut scalar = Scalar::new(name);
            if let Some(description) = description {
                scalar = scalar.description(description);
            }
            builder.register(scalar)
        }
        TypeKind::Object { fields, interfaces } => {
            let mut object = Object::new(name);
            if let Some(description) = description {
                object = object.description(description);
            }
            for interface in interfaces {
                object = object.implement(interface.name.as_str());
            }
            for field in fields {
                object = object.field(object_field(definition, field, types, resolvers)?);
            }
            builder.register(object)
        }
        TypeKind::Interface { fields } => {
            let mut interface = Interface::new(name);
            if let Some(description) = description {
                interface = interface.description(description);
            }
            for field in fields {
                let mut lowered = InterfaceField::new(field.name.as_str(), engine_type(&field.ty));
                if let Some(description) = &field.description {
                    lowered = lowered.description(description.as_str());
                }
                for arg in &field.args {
                    lowered = lowered.argument(input_value(arg, types)?);
                }
                if let Some(reason) = &field.deprecation_reason {
                    lowered = lowered.deprecation(Some(reason.as_str()));
                }
                interface = interface.field(lowered);
            }
            builder.register(interface)
        }
        TypeKind::Union { types: members } => {
            let mut lowered = Union::new(name);
            if let Some(description) = description {
                lowered = lowered.description(description);
            }
            for member in members {
                lowered = lowered.possible_type(member.name.as_str());
            }
            builder.register(lowered)
        }
        TypeKind::Enum { values } => {
            let mut lowered = Enum::new(name);
            if let Some(description) = description {
                lowered = lowered.description(description);
            }
            for value in values {
                lowered = lowered.item(enum_item(value));
            }
            builder.register(lowered)
        }
        TypeKind::InputObject { fields } => {
            let mut input = InputObject::new(name);
            if let Some(description) = description {
                input = input.description(description);
            }
            for field in fields {
                input = input.field(input_value(field, types)?);
            }
            builder.register(input)
        }
    })
}

fn object_field(
    parent: &TypeDefinition,
    field: &FieldDefinition,
    types: &TypeResolver,
    resolvers: &ResolverMap,
) -> Result<Field> {
    let resolver_name = field
        .resolve
        .as_deref()
        .unwrap_or(crate::resolvers::PROPERTY_RESOLVER);
    let resolver = resolvers
        .get(resolver_name)
        .ok_or_else(|| SchemaError::UnknownResolver {
            type_name: parent.name.clone(),
            field: field.name.clone(),
            resolver: resolver_name.to_string(),
        })?;

    let binding = Arc::new(FieldBinding {
        alias: types.alias().to_string(),
        type_name: parent.name.clone(),
        field_name: field.name.clone(),
        resolver,
        shape: OutputShape::of(&field.ty, types)?,
    });

    let mut lowered = Field::new(field.name.as_str(), engine_type(&field.ty), move |ctx| {
        let binding = Arc::clone(&binding);
        FieldFuture::new(async move { binding.call(&ctx) })
    });
    if let Some(description) = &field.description {
        lowered = lowered.description(description.as_str());
    }
    for arg in &field.args {
        lowered = lowered.argument(input_value(arg, types)?);
    }
    if let Some(reason) = &field.deprecation_reason {
        lowered = lowered.deprecation(Some(reason.as_str()));
    }
    Ok(lowered)
}

fn input_value(definition: &InputValueDefinition, types: &TypeResolver) -> Result<InputValue> {
    let mut lowered = InputValue::new(definition.name.as_str(), engine_type(&definition.ty));
    if let Some(description) = &definition.description {
        lowered = lowered.description(description.as_str());
    }
    if let Some(default) = &definition.default_value {
        lowered = lowered.default_value(default_value(definition, default, types)?);
    }
    Ok(lowered)
}

/// Enum defaults are written as names in the configuration
fn default_value(definition: &InputValueDefinition, default: &Value, types: &TypeResolver) -> Result<GqlValue> {
    let is_enum = types
        .get(definition.ty.named().id)
        .map(|target| matches!(target.kind, TypeKind::Enum { .. }))
        .unwrap_or(false);
    match default {
        Value::String(name) if is_enum => Ok(GqlValue::Enum(Name::new(name))),
        other => GqlValue::from_json(other.clone()).map_err(|e| SchemaError::Build {
            alias: types.alias().to_string(),
            message: format!("invalid default value for \"{}\": {}", definition.name, e),
        }),
    }
}

fn enum_item(value: &EnumValueDefinition) -> EnumItem {
    let mut item = EnumItem::new(value.name.as_str());
    if let Some(description) = &value.description {
        item = item.description(description.as_str());
    }
    if let Some(reason) = &value.deprecation_reason {
        item = item.deprecation(Some(reason.as_str()));
    }
    item
}

fn engine_type(ty: &TypeRef) -> EngineTypeRef {
    match ty {
        TypeRef::Named(named) => EngineTypeRef::named(named.name.clone()),
        TypeRef::List(inner) => EngineTypeRef::List(Box::new(engine_type(inner))),
        TypeRef::NonNull(inner) => EngineTypeRef::NonNull(Box::new(engine_type(inner))),
    }
}

/// Run one request against a lowered schema
pub(crate) async fn execute(schema: &EngineSchema, request: GraphQLRequest) -> ExecutionResult {
    let mut engine_request = Request::new(request.query);
    if let Some(variables) = request.variables {
        engine_request = engine_request.variables(Variables::from_json(variables));
    }
    if let Some(operation_name) = request.operation_name {
        engine_request = engine_request.operation_name(operation_name);
    }

    let response = schema.execute(engine_request).await;
    let errors = response
        .errors
        .into_iter()
        .map(|error| ExecutionError {
            message: error.message,
            path: error
                .path
                .into_iter()
                .map(|segment| match segment {
                    PathSegment::Field(name) => Value::String(name),
                    PathSegment::Index(index) => Value::from(index),
                })
                .collect(),
        })
        .collect();

    ExecutionResult {
        data: response_data(response.data),
        errors,
    }
}

fn response_data(data: GqlValue) -> Value {
    data.into_json().unwrap_or_else(|e| {
        warn!(error = %e, "response data is not representable as JSON");
        Value::Null
    })
}
