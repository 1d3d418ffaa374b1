//! Type expressions as written in field and argument declarations
//!
//! `"User"`, `"User!"`, `"[User]"`, `"[User!]!"`, nested lists allowed.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// GraphQL name rule
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_a-zA-Z][_a-zA-Z0-9]*$").expect("name pattern is a valid regex"));

/// A parsed, unresolved type expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Named(String),
    List(Box<TypeExpr>),
    NonNull(Box<TypeExpr>),
}

impl TypeExpr {
    /// Parse a type expression, returning `None` when malformed
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Some(inner) = input.strip_suffix('!') {
            let inner = Self::parse(inner)?;
            if matches!(inner, Self::NonNull(_)) {
                return None;
            }
            return Some(Self::NonNull(Box::new(inner)));
        }
        if let Some(rest) = input.strip_prefix('[') {
            let inner = rest.strip_suffix(']')?;
            return Some(Self::List(Box::new(Self::parse(inner)?)));
        }
        if is_valid_name(input) {
            Some(Self::Named(input.to_string()))
        } else {
            None
        }
    }

    /// The innermost named type
    pub fn named(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::List(inner) => write!(f, "[{}]", inner),
            Self::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// GraphQL name rule: `[_A-Za-z][_0-9A-Za-z]*`
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Scalars every schema provides without declaring them
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let expr = TypeExpr::parse("[User!]!").unwrap();
        assert_eq!(
            expr,
            TypeExpr::NonNull(Box::new(TypeExpr::List(Box::new(TypeExpr::NonNull(
                Box::new(TypeExpr::Named("User".to_string()))
            )))))
        );
        assert_eq!(expr.named(), "User");
        assert_eq!(expr.to_string(), "[User!]!");
    }

    #[test]
    fn test_parse_malformed() {
        for input in ["", "[User", "User]", "User!!", "Us er", "1User", "[]"] {
            assert!(TypeExpr::parse(input).is_none(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_valid_names() {
        for name in ["User", "_internal", "Query2", "a_b"] {
            assert!(is_valid_name(name), "rejected {:?}", name);
        }
        for name in ["", "2Fast", "my-user", "Ünïcode", "User\n"] {
            assert!(!is_valid_name(name), "accepted {:?}", name);
        }
    }
}
