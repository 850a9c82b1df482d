//! The `condition` node: picks a named branch based on the first matching
//! rule in an ordered list.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::{ExecutionContext, LogLevel};
use crate::error::NodeError;
use crate::executor::NodeExecutor;
use crate::resolver;

const OPERATORS: &[&str] = &["eq", "ne", "gt", "gte", "lt", "lte", "contains", "in"];

pub struct ConditionNode;

#[async_trait]
impl NodeExecutor for ConditionNode {
    fn node_type(&self) -> &'static str {
        "condition"
    }

    fn validate(&self, config: &Value) -> Result<(), NodeError> {
        let conditions = config
            .get("conditions")
            .and_then(Value::as_array)
            .ok_or_else(|| NodeError::validation("condition.conditions must be a non-empty array"))?;

        if conditions.is_empty() {
            return Err(NodeError::validation("condition.conditions must be non-empty"));
        }

        for (i, cond) in conditions.iter().enumerate() {
            let field = cond.get("field").and_then(Value::as_str);
            let operator = cond.get("operator").and_then(Value::as_str);
            let branch = cond.get("branch").and_then(Value::as_str);

            if field.is_none() {
                return Err(NodeError::validation(format!("conditions[{i}].field is required")));
            }
            let Some(op) = operator else {
                return Err(NodeError::validation(format!("conditions[{i}].operator is required")));
            };
            if !OPERATORS.contains(&op) {
                return Err(NodeError::validation(format!(
                    "conditions[{i}].operator '{op}' is not one of {OPERATORS:?}"
                )));
            }
            if branch.is_none() {
                return Err(NodeError::validation(format!("conditions[{i}].branch is required")));
            }
            if cond.get("value").is_none() {
                return Err(NodeError::validation(format!("conditions[{i}].value is required")));
            }
        }

        if let Some(default_branch) = config.get("default_branch") {
            if !default_branch.is_string() {
                return Err(NodeError::validation("condition.default_branch must be a string"));
            }
        }

        Ok(())
    }

    async fn execute(&self, config: &Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let conditions = config
            .get("conditions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let variables = ctx.variables_snapshot();

        for (index, cond) in conditions.iter().enumerate() {
            let field = cond["field"].as_str().unwrap_or_default();
            let operator = cond["operator"].as_str().unwrap_or_default();
            let expected = cond["value"].clone();
            let branch = cond["branch"].as_str().unwrap_or_default();

            let actual = match resolver::lookup(field, &variables) {
                Some(v) => v,
                None => {
                    ctx.add_log(
                        LogLevel::Warning,
                        format!("condition {index}: field '{field}' not found, skipping"),
                        None,
                        None,
                    );
                    continue;
                }
            };

            match evaluate(operator, &actual, &expected) {
                Ok(true) => {
                    return Ok(json!({
                        "branch": branch,
                        "matched_condition": index,
                        "field": field,
                        "actual_value": actual,
                        "expected_value": expected,
                        "operator": operator,
                    }));
                }
                Ok(false) => continue,
                Err(reason) => {
                    ctx.add_log(
                        LogLevel::Warning,
                        format!("condition {index}: {reason}, skipping"),
                        None,
                        None,
                    );
                    continue;
                }
            }
        }

        if let Some(default_branch) = config.get("default_branch").and_then(Value::as_str) {
            return Ok(json!({"branch": default_branch, "matched_condition": Value::Null}));
        }

        Err(NodeError::execution("no condition matched and no default_branch configured"))
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
}

fn evaluate(operator: &str, actual: &Value, expected: &Value) -> Result<bool, String> {
    match operator {
        "eq" => Ok(actual == expected),
        "ne" => Ok(actual != expected),
        "gt" | "gte" | "lt" | "lte" => {
            let (a, e) = (as_f64(actual), as_f64(expected));
            let (a, e) = match (a, e) {
                (Some(a), Some(e)) => (a, e),
                _ => return Err(format!("'{operator}' requires numeric operands")),
            };
            Ok(match operator {
                "gt" => a > e,
                "gte" => a >= e,
                "lt" => a < e,
                "lte" => a <= e,
                _ => unreachable!(),
            })
        }
        "contains" => match actual {
            Value::String(s) => {
                let needle = expected.as_str().ok_or("'contains' on a string needs a string value")?;
                Ok(s.contains(needle))
            }
            Value::Array(items) => Ok(items.contains(expected)),
            _ => Err("'contains' requires a string or array field value".to_string()),
        },
        "in" => match expected {
            Value::String(s) => {
                let needle = actual.as_str().ok_or("'in' against a string needs a string field value")?;
                Ok(s.contains(needle))
            }
            Value::Array(items) => Ok(items.contains(actual)),
            _ => Err("'in' requires a string or array value".to_string()),
        },
        other => Err(format!("unknown operator '{other}'")),
    }
}
