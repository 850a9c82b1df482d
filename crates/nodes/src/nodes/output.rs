//! The `output` node: selects and renders a workflow's terminal value.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::executor::NodeExecutor;
use crate::resolver;

const FORMATS: &[&str] = &["raw", "json", "text", "custom"];

pub struct OutputNode;

#[async_trait]
impl NodeExecutor for OutputNode {
    fn node_type(&self) -> &'static str {
        "output"
    }

    fn validate(&self, config: &Value) -> Result<(), NodeError> {
        if let Some(format) = config.get("format") {
            let format = format
                .as_str()
                .ok_or_else(|| NodeError::validation("output.format must be a string"))?;
            if !FORMATS.contains(&format) {
                return Err(NodeError::validation(format!(
                    "output.format '{format}' is not one of {FORMATS:?}"
                )));
            }
            if format == "custom" && !config.get("template").is_some_and(Value::is_string) {
                return Err(NodeError::validation("output.template is required for format 'custom'"));
            }
        }
        if let Some(fields) = config.get("fields") {
            if !fields.is_array() {
                return Err(NodeError::validation("output.fields must be an array"));
            }
        }
        if let Some(exclude) = config.get("exclude_fields") {
            if !exclude.is_array() {
                return Err(NodeError::validation("output.exclude_fields must be an array"));
            }
        }
        Ok(())
    }

    async fn execute(&self, config: &Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let source_id = config.get("source_node").and_then(Value::as_str).map(String::from);
        let source_id = source_id.or_else(|| ctx.last_completed_node_id());

        let selected = match source_id {
            Some(id) => ctx
                .get_node_output(&id)
                .ok_or_else(|| NodeError::execution(format!("source_node '{id}' has no output")))?,
            None => Value::Null,
        };

        let filtered = apply_field_filters(selected, config);

        let format = config.get("format").and_then(Value::as_str).unwrap_or("raw");
        match format {
            "raw" => Ok(filtered),
            "json" => {
                let pretty = config.get("pretty").and_then(Value::as_bool).unwrap_or(false);
                let text = if pretty {
                    serde_json::to_string_pretty(&filtered)
                } else {
                    serde_json::to_string(&filtered)
                }
                .map_err(|e| NodeError::execution(format!("failed to render json: {e}")))?;
                Ok(Value::String(text))
            }
            "text" => Ok(Value::String(render_text(&filtered))),
            "custom" => {
                let template = config.get("template").and_then(Value::as_str).unwrap_or_default();
                let mut view = ctx.variables_snapshot();
                view.insert("output".to_string(), filtered);
                Ok(Value::String(resolver::resolve_variables(template, &view)))
            }
            other => Err(NodeError::execution(format!("unknown output format '{other}'"))),
        }
    }
}

fn apply_field_filters(value: Value, config: &Value) -> Value {
    let Value::Object(map) = value else {
        return value;
    };

    if let Some(fields) = config.get("fields").and_then(Value::as_array) {
        let keep: Vec<&str> = fields.iter().filter_map(Value::as_str).collect();
        let mut out = Map::new();
        for key in keep {
            if let Some(v) = map.get(key) {
                out.insert(key.to_string(), v.clone());
            }
        }
        return Value::Object(out);
    }

    if let Some(exclude) = config.get("exclude_fields").and_then(Value::as_array) {
        let drop: Vec<&str> = exclude.iter().filter_map(Value::as_str).collect();
        let out: Map<String, Value> = map
            .into_iter()
            .filter(|(k, _)| !drop.contains(&k.as_str()))
            .collect();
        return Value::Object(out);
    }

    Value::Object(map)
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", render_scalar(v)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => render_scalar(other),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(Uuid::new_v4(), Uuid::new_v4(), json!({}), None)
    }

    #[tokio::test]
    async fn raw_passes_through_named_source() {
        let c = ctx();
        c.set_node_output("up", json!({"msg": "HI"}));
        let out = OutputNode
            .execute(&json!({"source_node": "up", "format": "raw"}), &c)
            .await
            .unwrap();
        assert_eq!(out, json!({"msg": "HI"}));
    }

    #[tokio::test]
    async fn falls_back_to_most_recently_completed_node() {
        let c = ctx();
        c.set_node_output("a", json!({"x": 1}));
        c.set_node_output("b", json!({"y": 2}));
        let out = OutputNode.execute(&json!({}), &c).await.unwrap();
        assert_eq!(out, json!({"y": 2}));
    }

    #[tokio::test]
    async fn fields_filter_wins_over_exclude_fields() {
        let c = ctx();
        c.set_node_output("n", json!({"a": 1, "b": 2, "c": 3}));
        let config = json!({
            "source_node": "n",
            "fields": ["a"],
            "exclude_fields": ["a"]
        });
        let out = OutputNode.execute(&config, &c).await.unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[tokio::test]
    async fn json_format_renders_string() {
        let c = ctx();
        c.set_node_output("n", json!({"a": 1}));
        let out = OutputNode
            .execute(&json!({"source_node": "n", "format": "json"}), &c)
            .await
            .unwrap();
        assert_eq!(out, json!(r#"{"a":1}"#));
    }

    #[tokio::test]
    async fn custom_format_resolves_output_namespace() {
        let c = ctx();
        c.set_node_output("n", json!({"name": "Ada"}));
        let config = json!({
            "source_node": "n",
            "format": "custom",
            "template": "Hello {{output.name}}"
        });
        let out = OutputNode.execute(&config, &c).await.unwrap();
        assert_eq!(out, json!("Hello Ada"));
    }

    #[test]
    fn validate_requires_template_for_custom_format() {
        assert!(OutputNode.validate(&json!({"format": "custom"})).is_err());
    }
}
