//! Field resolvers
//!
//! Object fields name their resolver in `resolve`. Names are looked up in a
//! [`ResolverMap`] when a schema is built; the map is the only thing shared
//! across aliases.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ResolveError;

/// Name of the builtin resolver reading `parent[field]`
pub const PROPERTY_RESOLVER: &str = "property";

/// What a resolver sees for one field invocation
#[derive(Debug, Clone, Copy)]
pub struct ResolveInfo<'a> {
    pub alias: &'a str,
    /// GraphQL name of the parent type
    pub type_name: &'a str,
    pub field_name: &'a str,
    /// Value produced for the parent object, `None` on root types
    pub parent: Option<&'a Value>,
    /// Coerced argument values
    pub args: &'a Map<String, Value>,
}

impl<'a> ResolveInfo<'a> {
    pub fn arg(&self, name: &str) -> Option<&'a Value> {
        self.args.get(name)
    }
}

/// Produces the value of one field
pub trait FieldResolver: Send + Sync {
    fn resolve(&self, info: &ResolveInfo<'_>) -> Result<Value, ResolveError>;
}

impl<F> FieldResolver for F
where
    F: Fn(&ResolveInfo<'_>) -> Result<Value, ResolveError> + Send + Sync,
{
    fn resolve(&self, info: &ResolveInfo<'_>) -> Result<Value, ResolveError> {
        self(info)
    }
}

/// Reads the field of the same name from the parent value
pub struct PropertyResolver;

impl FieldResolver for PropertyResolver {
    fn resolve(&self, info: &ResolveInfo<'_>) -> Result<Value, ResolveError> {
        Ok(info
            .parent
            .and_then(|parent| parent.get(info.field_name))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// Named field resolvers
#[derive(Clone)]
pub struct ResolverMap {
    resolvers: HashMap<String, Arc<dyn FieldResolver>>,
}

impl ResolverMap {
    /// A map holding only the builtin `property` resolver
    pub fn new() -> Self {
        let mut resolvers: HashMap<String, Arc<dyn FieldResolver>> = HashMap::new();
        resolvers.insert(PROPERTY_RESOLVER.to_string(), Arc::new(PropertyResolver));
        Self { resolvers }
    }

    /// Register a resolver, replacing any previous one with the same name
    pub fn insert(&mut self, name: impl Into<String>, resolver: impl FieldResolver + 'static) {
        self.resolvers.insert(name.into(), Arc::new(resolver));
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, resolver: impl FieldResolver + 'static) -> Self {
        self.insert(name, resolver);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FieldResolver>> {
        self.resolvers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ResolverMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResolverMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverMap").field("names", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info<'a>(parent: Option<&'a Value>, args: &'a Map<String, Value>) -> ResolveInfo<'a> {
        ResolveInfo {
            alias: "public",
            type_name: "User",
            field_name: "username",
            parent,
            args,
        }
    }

    #[test]
    fn test_property_resolver() {
        let args = Map::new();
        let parent = json!({"username": "user1"});
        let resolver = ResolverMap::new().get(PROPERTY_RESOLVER).unwrap();

        assert_eq!(resolver.resolve(&info(Some(&parent), &args)).unwrap(), json!("user1"));
        assert_eq!(resolver.resolve(&info(Some(&json!({})), &args)).unwrap(), Value::Null);
        assert_eq!(resolver.resolve(&info(None, &args)).unwrap(), Value::Null);
    }

    #[test]
    fn test_closure_resolvers() {
        let resolvers = ResolverMap::new()
            .with("echo", |info: &ResolveInfo<'_>| -> Result<Value, ResolveError> {
                Ok(info.arg("value").cloned().unwrap_or(Value::Null))
            })
            .with("fail", |_: &ResolveInfo<'_>| -> Result<Value, ResolveError> {
                Err(ResolveError::new("boom"))
            });

        let mut args = Map::new();
        args.insert("value".to_string(), json!(42));
        let echo = resolvers.get("echo").unwrap();
        assert_eq!(echo.resolve(&info(None, &args)).unwrap(), json!(42));

        let fail = resolvers.get("fail").unwrap();
        assert_eq!(fail.resolve(&info(None, &args)).unwrap_err().message(), "boom");

        assert_eq!(resolvers.names(), vec!["echo", "fail", "property"]);
        assert!(!resolvers.contains("missing"));
    }
}
