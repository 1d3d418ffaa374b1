//! Type inheritance
//!
//! A declaration listing `inherits: [Parent, ...]` receives its parents'
//! configuration, parents first and in list order, with its own entries
//! winning. Tables (`fields`, `values`) merge entry by entry, lists
//! (`interfaces`, `types`) are unioned. `name` is never inherited.
//!
//! Declarations marked `decorator: true` only exist to be inherited and are
//! dropped once every child has been resolved.

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::ConfigProcessor;
use crate::error::ConfigError;
use crate::raw::{self, RawConfig};

/// Merges inherited configuration and removes decorators
pub struct InheritanceProcessor;

impl ConfigProcessor for InheritanceProcessor {
    fn name(&self) -> &'static str {
        "inheritance"
    }

    fn apply(&self, config: &mut RawConfig) -> Result<(), ConfigError> {
        let keys = config.keys();
        let mut graph: DiGraph<String, ()> = DiGraph::with_capacity(keys.len(), keys.len());
        let nodes: HashMap<String, NodeIndex> = keys
            .iter()
            .map(|key| (key.clone(), graph.add_node(key.clone())))
            .collect();

        let mut parents_of: HashMap<String, Vec<String>> = HashMap::new();
        for key in &keys {
            let declaration = &config.types()[key];
            let parents = raw::string_list(&format!("{}.inherits", key), declaration.get("inherits"))?;
            for parent in &parents {
                let parent_idx = nodes.get(parent).ok_or_else(|| ConfigError::UnknownParent {
                    type_name: key.clone(),
                    parent: parent.clone(),
                })?;
                graph.add_edge(*parent_idx, nodes[key], ());
            }
            if !parents.is_empty() {
                parents_of.insert(key.clone(), parents);
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| cycle_error(&graph, cycle.node_id()))?;

        for idx in order {
            let key = &graph[idx];
            let Some(parents) = parents_of.get(key) else {
                continue;
            };

            let mut merged = Map::new();
            for parent in parents {
                let parent_config = raw::config_of(parent, &config.types()[parent])?;
                merge_into(&mut merged, parent_config, true);
            }

            let Some(declaration) = config.get_mut(key) else {
                continue;
            };
            let own = raw::config_of(key, declaration)?.clone();
            merge_into(&mut merged, &own, false);

            if let Value::Object(table) = declaration {
                table.remove("inherits");
                table.insert("config".to_string(), Value::Object(merged));
            }
        }

        config
            .types_mut()
            .retain(|_, declaration| !matches!(declaration.get("decorator"), Some(Value::Bool(true))));
        for declaration in config.types_mut().values_mut() {
            if let Value::Object(table) = declaration {
                table.remove("decorator");
            }
        }

        Ok(())
    }
}

fn merge_into(target: &mut Map<String, Value>, source: &Map<String, Value>, inherited: bool) {
    for (key, value) in source {
        if inherited && key == "name" {
            continue;
        }
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                for (entry, entry_value) in incoming {
                    existing.insert(entry.clone(), entry_value.clone());
                }
            }
            (Some(Value::Array(existing)), Value::Array(incoming)) => {
                for item in incoming {
                    if !existing.contains(item) {
                        existing.push(item.clone());
                    }
                }
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn cycle_error(graph: &DiGraph<String, ()>, start: NodeIndex) -> ConfigError {
    let mut types: Vec<String> = kosaraju_scc(graph)
        .into_iter()
        .find(|scc| scc.contains(&start))
        .unwrap_or_else(|| vec![start])
        .into_iter()
        .map(|idx| graph[idx].clone())
        .collect();
    types.sort();
    ConfigError::InheritanceCycle { types }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::test_support::*;
    use serde_json::json;

    #[test]
    fn test_merges_parent_fields() {
        let config = processed(
            &InheritanceProcessor,
            json!({
                "QueryBase": {"type": "object", "decorator": true, "config": {
                    "description": "base",
                    "fields": {"foo": {"type": "String!"}, "users": {"type": "UserConnection"}}
                }},
                "InternalQuery": {"type": "object", "inherits": ["QueryBase"], "config": {
                    "name": "Query",
                    "fields": {"bar": {"type": "String!"}, "foo": {"type": "String"}}
                }}
            }),
        );

        assert!(!config.contains("QueryBase"));
        let query = config.get("InternalQuery").unwrap();
        assert!(query.get("inherits").is_none());
        assert_eq!(query["config"]["name"], json!("Query"));
        assert_eq!(query["config"]["description"], json!("base"));
        assert_eq!(
            query["config"]["fields"],
            json!({"foo": {"type": "String"}, "users": {"type": "UserConnection"}, "bar": {"type": "String!"}})
        );
    }

    #[test]
    fn test_transitive_inheritance_and_interfaces() {
        let config = processed(
            &InheritanceProcessor,
            json!({
                "Child": {"type": "object", "inherits": ["Middle"], "config": {
                    "interfaces": ["Timestamped"], "fields": {"c": {"type": "Int"}}
                }},
                "Middle": {"type": "object", "inherits": ["Root"], "config": {
                    "interfaces": ["Node"], "fields": {"b": {"type": "Int"}}
                }},
                "Root": {"type": "object", "config": {"name": "RootName", "fields": {"a": {"type": "Int"}}}}
            }),
        );

        let child = &config.get("Child").unwrap()["config"];
        assert_eq!(child["interfaces"], json!(["Node", "Timestamped"]));
        assert_eq!(
            child["fields"],
            json!({"a": {"type": "Int"}, "b": {"type": "Int"}, "c": {"type": "Int"}})
        );
        assert!(child.get("name").is_none());
        assert!(config.contains("Root"));
    }

    #[test]
    fn test_unknown_parent() {
        let err = rejected(
            &InheritanceProcessor,
            json!({"User": {"type": "object", "inherits": ["Missing"], "config": {"fields": {}}}}),
        );
        assert_eq!(
            err,
            ConfigError::UnknownParent {
                type_name: "User".to_string(),
                parent: "Missing".to_string()
            }
        );
    }

    #[test]
    fn test_cycle() {
        let err = rejected(
            &InheritanceProcessor,
            json!({
                "A": {"type": "object", "inherits": ["B"], "config": {"fields": {}}},
                "B": {"type": "object", "inherits": ["A"], "config": {"fields": {}}},
                "C": {"type": "object", "config": {"fields": {}}}
            }),
        );
        assert_eq!(
            err,
            ConfigError::InheritanceCycle {
                types: vec!["A".to_string(), "B".to_string()]
            }
        );

        let err = rejected(
            &InheritanceProcessor,
            json!({"A": {"type": "object", "inherits": ["A"], "config": {"fields": {}}}}),
        );
        assert_eq!(err, ConfigError::InheritanceCycle { types: vec!["A".to_string()] });
    }

    #[test]
    fn test_rerun_rejected() {
        assert_rerun_rejected(
            &InheritanceProcessor,
            json!({"User": {"type": "object", "config": {"fields": {}}}}),
        );
    }
}
