//! The `input` node: shapes the run's raw input data into what downstream
//! nodes expect.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::executor::NodeExecutor;

pub struct InputNode;

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl NodeExecutor for InputNode {
    fn node_type(&self) -> &'static str {
        "input"
    }

    fn validate(&self, config: &Value) -> Result<(), NodeError> {
        if let Some(schema) = config.get("schema") {
            if !schema.is_object() {
                return Err(NodeError::validation("input.schema must be an object"));
            }
        }
        if let Some(defaults) = config.get("defaults") {
            if !defaults.is_object() {
                return Err(NodeError::validation("input.defaults must be an object"));
            }
        }
        if let Some(extract) = config.get("extract_field") {
            if !extract.is_string() {
                return Err(NodeError::validation("input.extract_field must be a string"));
            }
        }
        Ok(())
    }

    async fn execute(&self, config: &Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let mut working = ctx.input_data().clone();

        if let Some(field) = config.get("extract_field").and_then(Value::as_str) {
            if let Some(obj) = working.as_object() {
                if let Some(extracted) = obj.get(field) {
                    working = extracted.clone();
                } else {
                    ctx.add_log(
                        crate::context::LogLevel::Warning,
                        format!("extract_field '{field}' not found in input"),
                        None,
                        None,
                    );
                }
            }
        }

        if let Some(defaults) = config.get("defaults").and_then(Value::as_object) {
            if let Value::Object(ref mut map) = working {
                let mut applied = Vec::new();
                for (key, value) in defaults {
                    if !map.contains_key(key) {
                        applied.push(key.clone());
                    }
                    map.entry(key.clone()).or_insert_with(|| value.clone());
                }
                if !applied.is_empty() {
                    ctx.add_log(
                        crate::context::LogLevel::Info,
                        format!("applied default values for fields: {}", applied.join(", ")),
                        None,
                        None,
                    );
                }
            }
        }

        if config.get("validate").and_then(Value::as_bool).unwrap_or(false) {
            if let Some(schema) = config.get("schema").and_then(Value::as_object) {
                validate_schema(&working, schema)?;
            }
        }

        Ok(working)
    }
}

fn validate_schema(value: &Value, schema: &Map<String, Value>) -> Result<(), NodeError> {
    let mut failures = Vec::new();
    let obj = value.as_object();

    for (field, rule) in schema {
        let required = rule.get("required").and_then(Value::as_bool).unwrap_or(false);
        let expected_type = rule.get("type").and_then(Value::as_str);

        let field_value = obj.and_then(|o| o.get(field));
        match field_value {
            None => {
                if required {
                    failures.push(format!("'{field}' is required"));
                }
            }
            Some(v) => {
                if let Some(expected) = expected_type {
                    let actual = json_type_name(v);
                    if actual != expected {
                        failures.push(format!(
                            "'{field}' expected type {expected}, got {actual}"
                        ));
                    }
                }
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(NodeError::execution(failures.join("; ")))
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

    #[tokio::test]
    async fn passes_through_input_unchanged_with_empty_config() {
        let c = ctx(json!({"msg": "hi"}));
        let out = InputNode.execute(&json!({}), &c).await.unwrap();
        assert_eq!(out, json!({"msg": "hi"}));
    }

    #[tokio::test]
    async fn extracts_named_field() {
        let c = ctx(json!({"payload": {"a": 1}, "other": 2}));
        let out = InputNode
            .execute(&json!({"extract_field": "payload"}), &c)
            .await
            .unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[tokio::test]
    async fn left_merges_defaults() {
        let c = ctx(json!({"a": 1}));
        let out = InputNode
            .execute(&json!({"defaults": {"a": 99, "b": 2}}), &c)
            .await
            .unwrap();
        assert_eq!(out, json!({"a": 1, "b": 2}));
    }

    #[tokio::test]
    async fn logs_which_default_keys_were_applied() {
        let c = ctx(json!({"a": 1}));
        InputNode
            .execute(&json!({"defaults": {"a": 99, "b": 2}}), &c)
            .await
            .unwrap();

        let logs = c.logs_snapshot();
        let applied = logs
            .iter()
            .find(|l| l.message.contains("applied default values"))
            .expect("a log entry about applied defaults");
        assert_eq!(applied.message, "applied default values for fields: b");
    }

    #[tokio::test]
    async fn does_not_log_when_no_default_was_needed() {
        let c = ctx(json!({"a": 1, "b": 2}));
        InputNode
            .execute(&json!({"defaults": {"a": 99, "b": 99}}), &c)
            .await
            .unwrap();

        let logs = c.logs_snapshot();
        assert!(!logs.iter().any(|l| l.message.contains("applied default values")));
    }

    #[tokio::test]
    async fn schema_validation_aggregates_failures() {
        let c = ctx(json!({"age": "not-a-number"}));
        let config = json!({
            "validate": true,
            "schema": {
                "age": {"type": "number", "required": true},
                "name": {"type": "string", "required": true}
            }
        });
        let err = InputNode.execute(&config, &c).await.unwrap_err();
        let msg = err.message();
        assert!(msg.contains("age"));
        assert!(msg.contains("name"));
    }

    #[test]
    fn validate_rejects_non_object_schema() {
        assert!(InputNode.validate(&json!({"schema": "nope"})).is_err());
    }
}
