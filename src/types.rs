//! Compiled type definitions
//!
//! Definitions reference each other through [`TypeId`] slots owned by the
//! alias's [`TypeResolver`](crate::type_resolver::TypeResolver), never by
//! pointer, so self-referential and mutually-referential graphs need no
//! special ownership.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Slot index inside one alias's type resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A resolved reference to a named type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedType {
    /// GraphQL name of the target
    pub name: String,
    pub id: TypeId,
}

/// A resolved field or argument type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeRef {
    Named(NamedType),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// The innermost named type
    pub fn named(&self) -> &NamedType {
        match self {
            Self::Named(named) => named,
            Self::List(inner) | Self::NonNull(inner) => inner.named(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(named) => write!(f, "{}", named.name),
            Self::List(inner) => write!(f, "[{}]", inner),
            Self::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// Argument or input object field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
}

/// Object or interface field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub args: Vec<InputValueDefinition>,
    /// Name of the field resolver, `None` on interface fields
    pub resolve: Option<String>,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValueDefinition {
    pub name: String,
    /// Internal value the name stands for
    pub value: Value,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeKind {
    Scalar { builtin: bool },
    Object { fields: Vec<FieldDefinition>, interfaces: Vec<NamedType> },
    Interface { fields: Vec<FieldDefinition> },
    Union { types: Vec<NamedType> },
    Enum { values: Vec<EnumValueDefinition> },
    InputObject { fields: Vec<InputValueDefinition> },
}

/// A compiled GraphQL type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDefinition {
    pub id: TypeId,
    /// Declaration key in the raw configuration
    pub key: String,
    /// GraphQL name
    pub name: String,
    pub description: Option<String>,
    pub kind: TypeKind,
}

impl TypeDefinition {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TypeKind::Scalar { .. } => "scalar",
            TypeKind::Object { .. } => "object",
            TypeKind::Interface { .. } => "interface",
            TypeKind::Union { .. } => "union",
            TypeKind::Enum { .. } => "enum",
            TypeKind::InputObject { .. } => "input-object",
        }
    }

    /// Output fields of objects and interfaces
    pub fn fields(&self) -> &[FieldDefinition] {
        match &self.kind {
            TypeKind::Object { fields, .. } | TypeKind::Interface { fields } => fields,
            _ => &[],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields().iter().map(|f| f.name.as_str()).collect()
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface { .. } | TypeKind::Union { .. })
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.kind, TypeKind::Scalar { builtin: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_display() {
        let ty = TypeRef::NonNull(Box::new(TypeRef::List(Box::new(TypeRef::Named(NamedType {
            name: "User".to_string(),
            id: TypeId(3),
        })))));
        assert_eq!(ty.to_string(), "[User]!");
        assert_eq!(ty.named().id, TypeId(3));
    }
}
