//! Lazy type resolution
//!
//! A [`TypeResolver`] owns one alias's processed declarations and compiles
//! them into [`TypeDefinition`]s on first access. Each type gets a slot:
//!
//! - `Resolving` while its declaration is being compiled,
//! - `Resolved` once compiled; later lookups return the cached `Arc`.
//!
//! Compiling a type resolves the types it references. A reference to a slot
//! that is still `Resolving` is a cycle (`User.friends: [User]`) and is linked
//! by [`TypeId`] without recursing. Names that are neither declared nor
//! builtin scalars fail immediately with [`SchemaError::UnknownType`].
//!
//! The check-compile-store sequence runs under one lock per resolver, so
//! concurrent first accesses never compile a type twice.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::error::{ConfigError, Result, SchemaError};
use crate::raw::{self, DeclaredKind, RawConfig};
use crate::type_ref::{is_builtin_scalar, TypeExpr};
use crate::types::{
    EnumValueDefinition, FieldDefinition, InputValueDefinition, NamedType, TypeDefinition, TypeId,
    TypeKind, TypeRef,
};

enum SlotState {
    Resolving,
    Resolved(Arc<TypeDefinition>),
}

struct Slot {
    name: String,
    state: SlotState,
}

#[derive(Default)]
struct ResolverState {
    slots: Vec<Slot>,
    /// Keys and GraphQL names -> slot
    index: HashMap<String, TypeId>,
}

impl ResolverState {
    fn resolved(&self, id: TypeId) -> Option<Arc<TypeDefinition>> {
        match self.slots.get(id.0).map(|slot| &slot.state) {
            Some(SlotState::Resolved(definition)) => Some(Arc::clone(definition)),
            _ => None,
        }
    }

    fn rollback(&mut self, checkpoint: usize) {
        self.slots.truncate(checkpoint);
        self.index.retain(|_, id| id.0 < checkpoint);
    }
}

/// Per-alias lazy, caching, cycle-safe type lookup
pub struct TypeResolver {
    alias: String,
    declarations: Map<String, Value>,
    /// GraphQL name -> declaration key, where they differ
    names: HashMap<String, String>,
    state: Mutex<ResolverState>,
}

impl TypeResolver {
    /// Take ownership of a processed configuration
    pub fn new(config: RawConfig) -> Self {
        let alias = config.alias().to_string();
        let declarations = config.into_types();
        let names = declarations
            .iter()
            .filter_map(|(key, declaration)| {
                let name = raw::graphql_name(key, declaration);
                (name != key).then(|| (name.to_string(), key.clone()))
            })
            .collect();

        Self {
            alias,
            declarations,
            names,
            state: Mutex::new(ResolverState::default()),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Whether `name` is declared (by key or GraphQL name) or a builtin scalar
    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name) || self.names.contains_key(name) || is_builtin_scalar(name)
    }

    /// Declaration keys, in declaration order
    pub fn declared_types(&self) -> Vec<&str> {
        self.declarations.keys().map(String::as_str).collect()
    }

    /// Keys of the object declarations listing `interface` (key or GraphQL name)
    pub fn implementations(&self, interface: &str) -> Vec<&str> {
        let aliases: Vec<&str> = match self.locate(interface) {
            Some((key, Some(declaration))) => vec![key, raw::graphql_name(key, declaration)],
            _ => vec![interface],
        };
        self.declarations
            .iter()
            .filter(|(_, declaration)| {
                declaration
                    .get("config")
                    .and_then(|c| c.get("interfaces"))
                    .and_then(Value::as_array)
                    .map(|list| list.iter().filter_map(Value::as_str).any(|name| aliases.contains(&name)))
                    .unwrap_or(false)
            })
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Resolve a type by key or GraphQL name, compiling it on first access
    pub fn resolve(&self, name: &str) -> Result<Arc<TypeDefinition>> {
        let mut state = self.state.lock();
        if let Some(definition) = state.index.get(name).and_then(|id| state.resolved(*id)) {
            return Ok(definition);
        }

        let checkpoint = state.slots.len();
        let resolved = self
            .resolve_slot(&mut state, name)
            .and_then(|id| state.resolved(id).ok_or_else(|| SchemaError::UnknownType(name.to_string())));
        if resolved.is_err() {
            state.rollback(checkpoint);
        }
        resolved
    }

    /// Look up an already resolved slot
    pub fn get(&self, id: TypeId) -> Option<Arc<TypeDefinition>> {
        self.state.lock().resolved(id)
    }

    /// Every type resolved so far, in slot order
    pub fn resolved_types(&self) -> Vec<Arc<TypeDefinition>> {
        let state = self.state.lock();
        state
            .slots
            .iter()
            .filter_map(|slot| match &slot.state {
                SlotState::Resolved(definition) => Some(Arc::clone(definition)),
                SlotState::Resolving => None,
            })
            .collect()
    }

    fn locate<'a>(&'a self, name: &'a str) -> Option<(&'a str, Option<&'a Value>)> {
        if let Some((key, declaration)) = self.declarations.get_key_value(name) {
            return Some((key.as_str(), Some(declaration)));
        }
        if let Some(key) = self.names.get(name) {
            let declaration = self.declarations.get(key)?;
            return Some((key.as_str(), Some(declaration)));
        }
        is_builtin_scalar(name).then_some((name, None))
    }

    fn resolve_slot(&self, state: &mut ResolverState, name: &str) -> Result<TypeId> {
        if let Some(id) = state.index.get(name) {
            return Ok(*id);
        }
        let (key, declaration) = self
            .locate(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        let graphql_name = declaration
            .map(|declaration| raw::graphql_name(key, declaration))
            .unwrap_or(key)
            .to_string();

        let id = TypeId(state.slots.len());
        state.slots.push(Slot {
            name: graphql_name.clone(),
            state: SlotState::Resolving,
        });
        state.index.insert(key.to_string(), id);
        state.index.insert(graphql_name.clone(), id);
        trace!(alias = %self.alias, type_name = %graphql_name, slot = id.0, "compiling type");

        let definition = match declaration {
            None => TypeDefinition {
                id,
                key: key.to_string(),
                name: graphql_name,
                description: None,
                kind: TypeKind::Scalar { builtin: true },
            },
            Some(declaration) => self.compile(state, id, key, graphql_name, declaration)?,
        };
        state.slots[id.0].state = SlotState::Resolved(Arc::new(definition));
        Ok(id)
    }

    fn compile(
        &self,
        state: &mut ResolverState,
        id: TypeId,
        key: &str,
        name: String,
        declaration: &Value,
    ) -> Result<TypeDefinition> {
        let kind = raw::declared_kind(key, declaration).map_err(|e| self.invalid(e))?;
        let settings = raw::config_of(key, declaration).map_err(|e| self.invalid(e))?;

        let kind = match kind {
            DeclaredKind::Object => TypeKind::Object {
                fields: self.compile_fields(state, key, settings, true)?,
                interfaces: self.compile_names(state, key, settings, "interfaces")?,
            },
            DeclaredKind::Interface => TypeKind::Interface {
                fields: self.compile_fields(state, key, settings, false)?,
            },
            DeclaredKind::Union => TypeKind::Union {
                types: self.compile_names(state, key, settings, "types")?,
            },
            DeclaredKind::Enum => TypeKind::Enum {
                values: compile_values(settings),
            },
            DeclaredKind::InputObject => TypeKind::InputObject {
                fields: self.compile_inputs(state, key, settings.get("fields"))?,
            },
            DeclaredKind::CustomScalar => TypeKind::Scalar { builtin: false },
            DeclaredKind::RelayConnection => {
                return Err(self.invalid(ConfigError::UnknownKind {
                    type_name: key.to_string(),
                    kind: "relay-connection".to_string(),
                }))
            }
        };

        Ok(TypeDefinition {
            id,
            key: key.to_string(),
            name,
            description: string_of(settings.get("description")),
            kind,
        })
    }

    fn compile_fields(
        &self,
        state: &mut ResolverState,
        key: &str,
        settings: &Map<String, Value>,
        resolvable: bool,
    ) -> Result<Vec<FieldDefinition>> {
        let mut fields = Vec::new();
        for (name, field) in entries(settings.get("fields")) {
            let path = format!("{}.{}", key, name);
            fields.push(FieldDefinition {
                name: name.clone(),
                description: string_of(field.get("description")),
                ty: self.link(state, &path, field)?,
                args: self.compile_inputs(state, &path, field.get("args"))?,
                resolve: if resolvable { string_of(field.get("resolve")) } else { None },
                deprecation_reason: string_of(field.get("deprecationReason")),
            });
        }
        Ok(fields)
    }

    fn compile_inputs(
        &self,
        state: &mut ResolverState,
        path: &str,
        table: Option<&Value>,
    ) -> Result<Vec<InputValueDefinition>> {
        let mut inputs = Vec::new();
        for (name, input) in entries(table) {
            inputs.push(InputValueDefinition {
                name: name.clone(),
                description: string_of(input.get("description")),
                ty: self.link(state, &format!("{}.{}", path, name), input)?,
                default_value: input.get("defaultValue").cloned(),
            });
        }
        Ok(inputs)
    }

    fn compile_names(
        &self,
        state: &mut ResolverState,
        key: &str,
        settings: &Map<String, Value>,
        list: &str,
    ) -> Result<Vec<NamedType>> {
        let path = format!("{}.config.{}", key, list);
        raw::string_list(&path, settings.get(list))
            .map_err(|e| self.invalid(e))?
            .iter()
            .map(|name| self.named(state, name))
            .collect()
    }

    /// Resolve the type expression of a field, argument or input field
    fn link(&self, state: &mut ResolverState, path: &str, declaration: &Value) -> Result<TypeRef> {
        let type_ref = match declaration {
            Value::String(type_ref) => type_ref.as_str(),
            other => other
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| self.invalid(raw::missing(path, "type")))?,
        };
        let expr = TypeExpr::parse(type_ref).ok_or_else(|| {
            self.invalid(ConfigError::MalformedTypeRef {
                path: path.to_string(),
                type_ref: type_ref.to_string(),
            })
        })?;
        self.link_expr(state, &expr)
    }

    fn link_expr(&self, state: &mut ResolverState, expr: &TypeExpr) -> Result<TypeRef> {
        Ok(match expr {
            TypeExpr::Named(name) => TypeRef::Named(self.named(state, name)?),
            TypeExpr::List(inner) => TypeRef::List(Box::new(self.link_expr(state, inner)?)),
            TypeExpr::NonNull(inner) => TypeRef::NonNull(Box::new(self.link_expr(state, inner)?)),
        })
    }

    fn named(&self, state: &mut ResolverState, name: &str) -> Result<NamedType> {
        let id = self.resolve_slot(state, name)?;
        Ok(NamedType {
            name: state.slots[id.0].name.clone(),
            id,
        })
    }

    fn invalid(&self, source: ConfigError) -> SchemaError {
        SchemaError::Source {
            alias: self.alias.clone(),
            source,
        }
    }
}

fn compile_values(settings: &Map<String, Value>) -> Vec<EnumValueDefinition> {
    match settings.get("values") {
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(|name| EnumValueDefinition {
                name: name.to_string(),
                value: Value::String(name.to_string()),
                description: None,
                deprecation_reason: None,
            })
            .collect(),
        values => entries(values)
            .map(|(name, entry)| EnumValueDefinition {
                name: name.clone(),
                value: entry.get("value").cloned().unwrap_or_else(|| Value::String(name.clone())),
                description: string_of(entry.get("description")),
                deprecation_reason: string_of(entry.get("deprecationReason")),
            })
            .collect(),
    }
}

fn entries<'a>(table: Option<&'a Value>) -> impl Iterator<Item = (&'a String, &'a Value)> {
    table.and_then(Value::as_object).into_iter().flat_map(|map| map.iter())
}

fn string_of(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}
