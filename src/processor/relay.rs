//! Relay connection expansion
//!
//! Turns a `relay-connection` declaration into plain object declarations:
//!
//! ```text
//! UserConnection { edges: [UserEdge], pageInfo: PageInfo! }
//! UserEdge       { node: User, cursor: String! }
//! PageInfo       { hasNextPage: Boolean!, hasPreviousPage: Boolean!, startCursor: String, endCursor: String }
//! ```

use serde_json::{json, Map, Value};

use super::ConfigProcessor;
use crate::error::ConfigError;
use crate::raw::{self, DeclaredKind, RawConfig};

pub const PAGE_INFO: &str = "PageInfo";

/// Expands `relay-connection` declarations
pub struct RelayConnectionProcessor;

impl ConfigProcessor for RelayConnectionProcessor {
    fn name(&self) -> &'static str {
        "relay-connection"
    }

    fn apply(&self, config: &mut RawConfig) -> Result<(), ConfigError> {
        let mut needs_page_info = false;

        for key in config.keys() {
            let declaration = &config.types()[&key];
            if raw::declared_kind(&key, declaration)? != DeclaredKind::RelayConnection {
                continue;
            }

            let settings = raw::config_of(&key, declaration)?.clone();
            let node_type = settings
                .get("nodeType")
                .and_then(Value::as_str)
                .ok_or_else(|| raw::missing(&key, "config.nodeType"))?
                .to_string();
            let edge_key = edge_type_name(&key);

            let mut edge_fields = Map::new();
            edge_fields.insert("node".to_string(), json!(node_type));
            edge_fields.insert("cursor".to_string(), json!("String!"));
            extend_fields(&mut edge_fields, &key, "edgeFields", settings.get("edgeFields"))?;

            let mut connection_fields = Map::new();
            connection_fields.insert("edges".to_string(), json!(format!("[{}]", edge_key)));
            connection_fields.insert("pageInfo".to_string(), json!(format!("{}!", PAGE_INFO)));
            extend_fields(
                &mut connection_fields,
                &key,
                "connectionFields",
                settings.get("connectionFields"),
            )?;

            let mut connection_config = Map::new();
            if let Some(name) = settings.get("name") {
                connection_config.insert("name".to_string(), name.clone());
            }
            if let Some(description) = settings.get("description") {
                connection_config.insert("description".to_string(), description.clone());
            }
            connection_config.insert("fields".to_string(), Value::Object(connection_fields));

            config.types_mut().insert(
                key.clone(),
                json!({"type": "object", "config": Value::Object(connection_config)}),
            );
            if config.contains(&edge_key) {
                return Err(ConfigError::ConflictingType {
                    name: edge_key.clone(),
                    first: edge_key,
                    second: key,
                });
            }
            config.insert(
                edge_key,
                json!({"type": "object", "config": {"fields": Value::Object(edge_fields)}}),
            )?;
            needs_page_info = true;
        }

        if needs_page_info && !config.contains(PAGE_INFO) {
            config.insert(
                PAGE_INFO,
                json!({
                    "type": "object",
                    "config": {
                        "description": "Information about pagination in a connection.",
                        "fields": {
                            "hasNextPage": "Boolean!",
                            "hasPreviousPage": "Boolean!",
                            "startCursor": "String",
                            "endCursor": "String"
                        }
                    }
                }),
            )?;
        }

        Ok(())
    }
}

/// `UserConnection` -> `UserEdge`, `Friends` -> `FriendsEdge`
pub fn edge_type_name(connection: &str) -> String {
    let base = connection.strip_suffix("Connection").unwrap_or(connection);
    format!("{}Edge", base)
}

fn extend_fields(
    fields: &mut Map<String, Value>,
    type_name: &str,
    key: &str,
    extra: Option<&Value>,
) -> Result<(), ConfigError> {
    match extra {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Object(extra)) => {
            for (name, field) in extra {
                fields.insert(name.clone(), field.clone());
            }
            Ok(())
        }
        Some(other) => Err(raw::not_a_table(&format!("{}.config.{}", type_name, key), other)),
    }
}
