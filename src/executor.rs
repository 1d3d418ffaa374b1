//! Request execution
//!
//! The [`RequestExecutor`] is the query boundary: it picks the schema of the
//! requested alias from the registry and hands the request to the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::registry::SchemaRegistry;
use crate::schema::Schema;

/// A GraphQL request as received from a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }
}

/// One error reported by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub message: String,
    /// Field names and list indices leading to the failing field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
}

/// `{data, errors}` response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub data: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ExecutionError>,
}

impl ExecutionResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Dispatches requests to the schema of their alias
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    registry: Arc<SchemaRegistry>,
}

impl RequestExecutor {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The schema of `alias`, or of the default alias
    pub fn get_schema(&self, alias: Option<&str>) -> Result<Arc<Schema>> {
        match alias {
            Some(alias) => self.registry.get_schema(alias),
            None => self.registry.get_default_schema(),
        }
    }

    /// Execute `request` against the schema of `alias`
    ///
    /// Unknown or failed aliases are errors; everything the engine reports
    /// (syntax, validation, resolver failures) ends up in
    /// [`ExecutionResult::errors`].
    pub async fn execute(&self, alias: Option<&str>, request: GraphQLRequest) -> Result<ExecutionResult> {
        let schema = self.get_schema(alias)?;
        let result = schema.execute(request).await;
        if result.is_ok() {
            debug!(alias = schema.alias(), "request executed");
        } else {
            warn!(alias = schema.alias(), errors = result.errors.len(), "request executed with errors");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_deserialize() {
        let request: GraphQLRequest = serde_json::from_value(json!({
            "query": "query Q($id: ID!) { node(id: $id) { id } }",
            "variables": {"id": "1"},
            "operationName": "Q"
        }))
        .unwrap();
        assert_eq!(
            request,
            GraphQLRequest::new("query Q($id: ID!) { node(id: $id) { id } }")
                .variables(json!({"id": "1"}))
                .operation_name("Q")
        );
    }

    #[test]
    fn test_result_serialize() {
        let result = ExecutionResult {
            data: json!({"foo": "foo"}),
            errors: Vec::new(),
        };
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"data": {"foo": "foo"}}));

        let result = ExecutionResult {
            data: Value::Null,
            errors: vec![ExecutionError {
                message: "boom".to_string(),
                path: vec![json!("users"), json!(0)],
            }],
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"data": null, "errors": [{"message": "boom", "path": ["users", 0]}]})
        );
    }
}
