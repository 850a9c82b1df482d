//! The `transform` node: reshapes data.
//!
//! `transform_type: custom` does not carry a general expression evaluator —
//! no scripting engine ships with this core — but runs a small whitelisted
//! string operation against the source object, which is enough to cover the
//! "uppercase a field" style of custom transform without evaluating
//! arbitrary code.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::{ExecutionContext, LogLevel};
use crate::error::NodeError;
use crate::executor::NodeExecutor;

const TRANSFORM_TYPES: &[&str] = &["mapping", "filter", "extract", "merge", "custom"];
const CUSTOM_OPERATIONS: &[&str] = &["uppercase", "lowercase"];

pub struct TransformNode;

/// Resolve the object a `filter`/`extract`/`custom` transform works against:
/// the named `source_node`'s recorded output when given, else the run's raw
/// input data. Mirrors the pattern `merge` already uses for its `sources`
/// list, generalized to a single optional upstream node.
fn resolve_source(config: &Value, ctx: &ExecutionContext) -> Value {
    match config.get("source_node").and_then(Value::as_str) {
        Some(source_id) => ctx.get_node_output(source_id).unwrap_or_else(|| {
            ctx.add_log(
                LogLevel::Warning,
                format!("source_node '{source_id}' has no output, falling back to input data"),
                None,
                None,
            );
            ctx.input_data().clone()
        }),
        None => ctx.input_data().clone(),
    }
}

#[async_trait]
impl NodeExecutor for TransformNode {
    fn node_type(&self) -> &'static str {
        "transform"
    }

    fn validate(&self, config: &Value) -> Result<(), NodeError> {
        let transform_type = config
            .get("transform_type")
            .and_then(Value::as_str)
            .ok_or_else(|| NodeError::validation("transform.transform_type is required"))?;

        if !TRANSFORM_TYPES.contains(&transform_type) {
            return Err(NodeError::validation(format!(
                "transform.transform_type '{transform_type}' is not one of {TRANSFORM_TYPES:?}"
            )));
        }

        match transform_type {
            "mapping" => {
                if !config.get("mappings").is_some_and(Value::is_object) {
                    return Err(NodeError::validation("transform.mappings must be an object"));
                }
            }
            "filter" => {
                if !config.get("fields").is_some_and(Value::is_array) {
                    return Err(NodeError::validation("transform.fields must be an array"));
                }
            }
            "extract" => {
                if !config.get("fields").is_some_and(Value::is_array) {
                    return Err(NodeError::validation("transform.fields must be a non-empty array"));
                }
            }
            "merge" => {
                if !config.get("sources").is_some_and(Value::is_array) {
                    return Err(NodeError::validation("transform.sources must be an array"));
                }
            }
            "custom" => {
                let operation = config
                    .get("operation")
                    .and_then(Value::as_str)
                    .ok_or_else(|| NodeError::validation("transform.operation is required for transform_type 'custom'"))?;
                if !CUSTOM_OPERATIONS.contains(&operation) {
                    return Err(NodeError::validation(format!(
                        "transform.operation '{operation}' is not one of {CUSTOM_OPERATIONS:?}"
                    )));
                }
            }
            _ => unreachable!(),
        }

        Ok(())
    }

    async fn execute(&self, config: &Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let transform_type = config["transform_type"].as_str().unwrap_or_default();

        match transform_type {
            "mapping" => {
                let mappings = config["mappings"].as_object().cloned().unwrap_or_default();
                Ok(Value::Object(mappings))
            }
            "filter" => {
                let fields: Vec<String> = config["fields"]
                    .as_array()
                    .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                    .unwrap_or_default();
                let source = resolve_source(config, ctx).as_object().cloned().unwrap_or_default();
                let mut out = Map::new();
                for field in fields {
                    if let Some(v) = source.get(&field) {
                        out.insert(field, v.clone());
                    }
                }
                Ok(Value::Object(out))
            }
            "extract" => {
                let fields: Vec<String> = config["fields"]
                    .as_array()
                    .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                    .unwrap_or_default();
                let source = resolve_source(config, ctx).as_object().cloned().unwrap_or_default();

                if fields.len() == 1 {
                    Ok(source.get(&fields[0]).cloned().unwrap_or(Value::Null))
                } else {
                    let mut out = Map::new();
                    for field in fields {
                        out.insert(field.clone(), source.get(&field).cloned().unwrap_or(Value::Null));
                    }
                    Ok(Value::Object(out))
                }
            }
            "merge" => {
                let sources: Vec<String> = config["sources"]
                    .as_array()
                    .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                    .unwrap_or_default();

                let mut out = Map::new();
                for source_id in sources {
                    match ctx.get_node_output(&source_id) {
                        Some(Value::Object(map)) => {
                            for (k, v) in map {
                                out.insert(k, v);
                            }
                        }
                        Some(scalar) => {
                            out.insert(source_id, scalar);
                        }
                        None => {
                            ctx.add_log(
                                LogLevel::Warning,
                                format!("merge source '{source_id}' has no output, skipping"),
                                None,
                                None,
                            );
                        }
                    }
                }
                Ok(Value::Object(out))
            }
            "custom" => {
                let operation = config["operation"].as_str().unwrap_or_default();
                let source = resolve_source(config, ctx).as_object().cloned().unwrap_or_default();

                let mut out = Map::new();
                for (key, value) in source {
                    let transformed = match (operation, &value) {
                        ("uppercase", Value::String(s)) => Value::String(s.to_uppercase()),
                        ("lowercase", Value::String(s)) => Value::String(s.to_lowercase()),
                        _ => value,
                    };
                    out.insert(key, transformed);
                }
                out.insert("transformed".to_string(), Value::Bool(true));

                ctx.add_log(
                    LogLevel::Info,
                    format!("applied custom operation '{operation}' to {} fields", out.len() - 1),
                    None,
                    None,
                );

                Ok(Value::Object(out))
            }
            other => Err(NodeError::execution(format!("unknown transform_type '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn ctx(input: Value) -> ExecutionContext {
        ExecutionContext::new(Uuid::new_v4(), Uuid::new_v4(), input, None)
    }

    #[test]
    fn validate_requires_a_recognized_custom_operation() {
        let err = TransformNode.validate(&json!({"transform_type": "custom"})).unwrap_err();
        assert!(err.message().contains("operation"));

        let err = TransformNode
            .validate(&json!({"transform_type": "custom", "operation": "delete_everything"}))
            .unwrap_err();
        assert!(err.message().contains("operation"));

        assert!(TransformNode
            .validate(&json!({"transform_type": "custom", "operation": "uppercase"}))
            .is_ok());
    }

    #[tokio::test]
    async fn custom_uppercase_transforms_string_fields_and_marks_transformed() {
        let c = ctx(json!({"msg": "hi"}));
        let config = json!({"transform_type": "custom", "operation": "uppercase"});
        let out = TransformNode.execute(&config, &c).await.unwrap();
        assert_eq!(out, json!({"msg": "HI", "transformed": true}));
    }

    #[tokio::test]
    async fn custom_reads_from_source_node_when_given() {
        let c = ctx(json!({}));
        c.set_node_output("in", json!({"msg": "hi"}));
        let config = json!({"transform_type": "custom", "operation": "uppercase", "source_node": "in"});
        let out = TransformNode.execute(&config, &c).await.unwrap();
        assert_eq!(out, json!({"msg": "HI", "transformed": true}));
    }

    #[tokio::test]
    async fn filter_reads_from_source_node_when_given() {
        let c = ctx(json!({"a": 1}));
        c.set_node_output("up", json!({"a": 1, "b": 2}));
        let config = json!({"transform_type": "filter", "fields": ["b"], "source_node": "up"});
        let out = TransformNode.execute(&config, &c).await.unwrap();
        assert_eq!(out, json!({"b": 2}));
    }

    #[tokio::test]
    async fn mapping_passes_through_resolved_values() {
        let c = ctx(json!({}));
        let config = json!({"transform_type": "mapping", "mappings": {"greeting": "hi there"}});
        let out = TransformNode.execute(&config, &c).await.unwrap();
        assert_eq!(out, json!({"greeting": "hi there"}));
    }

    #[tokio::test]
    async fn filter_keeps_only_listed_fields() {
        let c = ctx(json!({"a": 1, "b": 2, "c": 3}));
        let config = json!({"transform_type": "filter", "fields": ["a", "c"]});
        let out = TransformNode.execute(&config, &c).await.unwrap();
        assert_eq!(out, json!({"a": 1, "c": 3}));
    }

    #[tokio::test]
    async fn extract_single_field_returns_value_directly() {
        let c = ctx(json!({"a": {"nested": true}}));
        let config = json!({"transform_type": "extract", "fields": ["a"]});
        let out = TransformNode.execute(&config, &c).await.unwrap();
        assert_eq!(out, json!({"nested": true}));
    }

    #[tokio::test]
    async fn merge_combines_object_outputs_and_skips_missing() {
        let c = ctx(json!({}));
        c.set_node_output("a", json!({"a": 1}));
        c.set_node_output("b", json!({"b": 2}));
        let config = json!({"transform_type": "merge", "sources": ["a", "b", "missing"]});
        let out = TransformNode.execute(&config, &c).await.unwrap();
        assert_eq!(out, json!({"a": 1, "b": 2}));
    }

    #[tokio::test]
    async fn merge_attaches_scalar_sources_under_their_id() {
        let c = ctx(json!({}));
        c.set_node_output("count", json!(5));
        let config = json!({"transform_type": "merge", "sources": ["count"]});
        let out = TransformNode.execute(&config, &c).await.unwrap();
        assert_eq!(out, json!({"count": 5}));
    }
}
