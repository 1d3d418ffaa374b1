//! Reference validation
//!
//! Last step of the standard pipeline: every type named by a field, argument,
//! interface list or union must exist in the alias and be of a kind allowed
//! at that position.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::ConfigProcessor;
use crate::error::ConfigError;
use crate::raw::{self, DeclaredKind, RawConfig};
use crate::type_ref::{TypeExpr, BUILTIN_SCALARS};

/// Validates type references across the alias
pub struct ReferenceProcessor;

impl ConfigProcessor for ReferenceProcessor {
    fn name(&self) -> &'static str {
        "references"
    }

    fn apply(&self, config: &mut RawConfig) -> Result<(), ConfigError> {
        let table = KindTable::build(config)?;

        for (key, declaration) in config.types() {
            let kind = raw::declared_kind(key, declaration)?;
            let settings = raw::config_of(key, declaration)?;

            match kind {
                DeclaredKind::Object | DeclaredKind::Interface => {
                    for (name, field) in fields(key, settings)? {
                        let path = format!("{}.{}", key, name);
                        table.check_type(&path, field, Position::Output)?;
                        if let Some(Value::Object(args)) = field.get("args") {
                            for (arg_name, arg) in args {
                                table.check_type(&format!("{}({})", path, arg_name), arg, Position::Input)?;
                            }
                        }
                    }
                    let path = format!("{}.config.interfaces", key);
                    for interface in raw::string_list(&path, settings.get("interfaces"))? {
                        table.check_named(&path, &interface, Position::Interface)?;
                    }
                }
                DeclaredKind::InputObject => {
                    for (name, field) in fields(key, settings)? {
                        table.check_type(&format!("{}.{}", key, name), field, Position::Input)?;
                    }
                }
                DeclaredKind::Union => {
                    let path = format!("{}.config.types", key);
                    for member in raw::string_list(&path, settings.get("types"))? {
                        table.check_named(&path, &member, Position::UnionMember)?;
                    }
                }
                DeclaredKind::Enum | DeclaredKind::CustomScalar | DeclaredKind::RelayConnection => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Position {
    Output,
    Input,
    Interface,
    UnionMember,
}

impl Position {
    fn accepts(&self, kind: DeclaredKind) -> bool {
        match self {
            Self::Output => kind.is_output(),
            Self::Input => kind.is_input(),
            Self::Interface => kind == DeclaredKind::Interface,
            Self::UnionMember => kind == DeclaredKind::Object,
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Self::Output => "an output type",
            Self::Input => "an input type",
            Self::Interface => "an interface",
            Self::UnionMember => "an object type",
        }
    }
}

/// Kind of every name (key or GraphQL name) visible in the alias
struct KindTable {
    kinds: HashMap<String, DeclaredKind>,
}

impl KindTable {
    fn build(config: &RawConfig) -> Result<Self, ConfigError> {
        let mut kinds: HashMap<String, DeclaredKind> = BUILTIN_SCALARS
            .iter()
            .map(|name| (name.to_string(), DeclaredKind::CustomScalar))
            .collect();
        for (key, declaration) in config.types() {
            let kind = raw::declared_kind(key, declaration)?;
            kinds.insert(key.clone(), kind);
            kinds.insert(raw::graphql_name(key, declaration).to_string(), kind);
        }
        Ok(Self { kinds })
    }

    fn check_type(&self, path: &str, declaration: &Value, position: Position) -> Result<(), ConfigError> {
        let type_ref = declaration
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| raw::missing(path, "type"))?;
        let expr = TypeExpr::parse(type_ref).ok_or_else(|| ConfigError::MalformedTypeRef {
            path: path.to_string(),
            type_ref: type_ref.to_string(),
        })?;
        self.check_named(path, expr.named(), position)
    }

    fn check_named(&self, path: &str, name: &str, position: Position) -> Result<(), ConfigError> {
        let kind = self.kinds.get(name).ok_or_else(|| ConfigError::UnknownReference {
            path: path.to_string(),
            reference: name.to_string(),
            suggestion: self.suggest(name),
        })?;
        if position.accepts(*kind) {
            Ok(())
        } else {
            Err(ConfigError::InvalidKindReference {
                path: path.to_string(),
                reference: name.to_string(),
                expected: position.expected(),
            })
        }
    }

    fn suggest(&self, name: &str) -> Option<String> {
        let matcher = SkimMatcherV2::default();
        self.kinds
            .keys()
            .filter_map(|candidate| matcher.fuzzy_match(candidate, name).map(|score| (score, candidate)))
            .max_by(|(a, a_name), (b, b_name)| a.cmp(b).then_with(|| b_name.cmp(a_name)))
            .map(|(_, candidate)| candidate.clone())
    }
}

fn fields<'a>(key: &str, settings: &'a Map<String, Value>) -> Result<&'a Map<String, Value>, ConfigError> {
    match settings.get("fields") {
        Some(Value::Object(fields)) => Ok(fields),
        Some(other) => Err(raw::not_a_table(&format!("{}.fields", key), other)),
        None => Err(raw::missing(key, "fields")),
    }
}
