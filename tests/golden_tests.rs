//! Golden Tests for the Processor Pipeline
//!
//! Runs the standard pipeline over a blog-shaped mapping and compares the
//! result with the checked-in expectation, then builds and queries it.

use graphql_schemas::{
    GraphQLRequest, Pipeline, PipelineOptions, RawConfig, ResolveError, ResolveInfo, ResolverMap, Schema,
    SchemaDefinition, SchemaError, TypeKind,
};
use serde_json::{json, Value};

fn blog(alias: &str) -> RawConfig {
    let value: Value = serde_json::from_str(include_str!("fixtures/pipeline/blog.json")).unwrap();
    RawConfig::from_value(alias, value).unwrap()
}

fn resolvers() -> ResolverMap {
    ResolverMap::new()
        .with("author", |_: &ResolveInfo<'_>| -> Result<Value, ResolveError> {
            Ok(json!({"id": "a1", "name": "Ada", "role": "ADMIN", "createdAt": "2020-01-01"}))
        })
        .with("posts", |info: &ResolveInfo<'_>| -> Result<Value, ResolveError> {
            let first = info.arg("first").and_then(Value::as_u64).unwrap_or(10) as usize;
            let edges: Vec<Value> = (1..=3)
                .take(first)
                .map(|n| json!({"cursor": format!("c{}", n), "node": {"id": format!("p{}", n), "title": format!("Post {}", n)}}))
                .collect();
            Ok(json!({
                "edges": edges,
                "pageInfo": {"hasNextPage": first < 3, "hasPreviousPage": false}
            }))
        })
}

// =============================================================================
// Pipeline output
// =============================================================================

#[test]
fn test_standard_pipeline_output() {
    let mut config = blog("public");
    Pipeline::standard(&PipelineOptions::default()).run(&mut config).unwrap();

    let expected: Value = serde_json::from_str(include_str!("fixtures/pipeline/blog.expected.json")).unwrap();
    assert_eq!(Value::Object(config.types().clone()), expected);
    assert_eq!(
        config.applied(),
        &[
            "relay-connection",
            "shorthand",
            "inheritance",
            "named",
            "visibility",
            "deprecation",
            "default-resolver",
            "references"
        ]
    );
}

#[test]
fn test_internal_alias_keeps_restricted_field() {
    let mut config = blog("internal");
    Pipeline::standard(&PipelineOptions::default()).run(&mut config).unwrap();

    let secret = &config.get("Author").unwrap()["config"]["fields"]["secret"];
    assert_eq!(secret, &json!({"type": "String", "resolve": "property"}));
}

#[test]
fn test_pipeline_runs_once() {
    let pipeline = Pipeline::standard(&PipelineOptions::default());
    let mut config = blog("public");
    pipeline.run(&mut config).unwrap();

    let err = pipeline.run(&mut config).unwrap_err();
    assert!(
        matches!(err, SchemaError::Config { processor: "relay-connection", .. }),
        "{}",
        err
    );
}

#[test]
fn test_inheritance_cycle_fails_pipeline() {
    let mut config = RawConfig::from_value(
        "public",
        json!({
            "A": {"type": "object", "inherits": ["B"], "config": {"fields": {"a": "Int"}}},
            "B": {"type": "object", "inherits": ["A"], "config": {"fields": {"b": "Int"}}}
        }),
    )
    .unwrap();

    let err = Pipeline::standard(&PipelineOptions::default()).run(&mut config).unwrap_err();
    assert!(matches!(err, SchemaError::Config { processor: "inheritance", .. }), "{}", err);
    assert!(err.to_string().contains("A"));
}

// =============================================================================
// Built schema
// =============================================================================

#[test]
fn test_blog_schema_sdl() {
    let schema = Schema::build(
        &SchemaDefinition::new("Query"),
        blog("public"),
        &PipelineOptions::default(),
        &resolvers(),
    )
    .unwrap();

    let sdl = schema.sdl();
    assert!(sdl.contains("type Article implements Node"), "{}", sdl);
    assert!(sdl.contains("enum Role"), "{}", sdl);
    assert!(!sdl.contains("secret"), "{}", sdl);
    assert!(!sdl.contains("Timestamped"), "{}", sdl);

    let node = schema.get_type("Node").unwrap();
    assert!(matches!(node.kind, TypeKind::Interface { .. }));
    assert_eq!(schema.get_type("Post").unwrap().name, "Article");
}

#[tokio::test]
async fn test_blog_schema_query() {
    let schema = Schema::build(
        &SchemaDefinition::new("Query"),
        blog("public"),
        &PipelineOptions::default(),
        &resolvers(),
    )
    .unwrap();

    let result = schema
        .execute(GraphQLRequest::new(
            "{ posts(first: 2) { edges { cursor node { title author { name role } } } pageInfo { hasNextPage } } }",
        ))
        .await;
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let author = json!({"name": "Ada", "role": "ADMIN"});
    assert_eq!(
        result.data,
        json!({"posts": {
            "edges": [
                {"cursor": "c1", "node": {"title": "Post 1", "author": author}},
                {"cursor": "c2", "node": {"title": "Post 2", "author": author}}
            ],
            "pageInfo": {"hasNextPage": true}
        }})
    );
}
