//! `{{dotted.path}}` interpolation over the execution context's variables.

use serde_json::{Map, Value};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Replace every `{{a.b.c}}` placeholder in `template` with the value found
/// by descending `variables` one dotted segment at a time.
///
/// A placeholder whose path can't be fully resolved (missing key, or a
/// non-object encountered partway through) is left in the output verbatim,
/// braces included — callers can tell an unresolved reference apart from a
/// literal value that happened to render the same way.
///
/// Resolving an already-resolved string is a no-op: output containing no
/// `{{` is returned unchanged.
pub fn resolve_variables(template: &str, variables: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let Some(end) = after_open.find(CLOSE) else {
            // Unterminated placeholder: emit the rest verbatim and stop.
            out.push_str(&rest[start..]);
            return out;
        };

        let path = after_open[..end].trim();
        match lookup(path, variables) {
            Some(value) => out.push_str(&value_to_text(&value)),
            None => {
                out.push_str(OPEN);
                out.push_str(path);
                out.push_str(CLOSE);
            }
        }

        rest = &after_open[end + CLOSE.len()..];
    }

    out.push_str(rest);
    out
}

/// Resolve a single `{{...}}` expression directly to a [`Value`], preserving
/// its type instead of stringifying it. Used when a whole config field is a
/// single placeholder (e.g. `"input": "{{nodes.fetch.result}}"`), so a
/// resolved object or number survives as itself.
pub fn resolve_value(template: &str, variables: &Map<String, Value>) -> Value {
    let trimmed = template.trim();
    if let Some(path) = trimmed
        .strip_prefix(OPEN)
        .and_then(|s| s.strip_suffix(CLOSE))
    {
        if !path.contains(OPEN) {
            if let Some(value) = lookup(path.trim(), variables) {
                return value;
            }
        }
    }
    Value::String(resolve_variables(template, variables))
}

/// Walk every string leaf of a JSON value through [`resolve_value`], so a
/// node's whole config map can be resolved in one call. Objects recurse into
/// every value kind; array elements are resolved only when they are strings
/// themselves — a nested object or list inside an array passes through
/// untouched, matching the node executors' own variable-resolution behavior.
pub fn resolve_json(value: &Value, variables: &Map<String, Value>) -> Value {
    match value {
        Value::String(s) => resolve_value(s, variables),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_json(v, variables)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| match v {
                    Value::String(s) => resolve_value(s, variables),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Look up a single dotted path directly, without the `{{...}}` wrapper.
/// Used by nodes whose config fields are themselves paths rather than
/// templates (e.g. a condition's `field`).
pub fn lookup(path: &str, variables: &Map<String, Value>) -> Option<Value> {
    if path.is_empty() {
        return None;
    }
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = variables.get(first)?.clone();

    for segment in segments {
        match current {
            Value::Object(ref map) => current = map.get(segment)?.clone(),
            Value::Array(ref items) => {
                let idx: usize = segment.parse().ok()?;
                current = items.get(idx)?.clone();
            }
            _ => return None,
        }
    }
    Some(current)
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars() -> Map<String, Value> {
        json!({
            "input": {"name": "Ada"},
            "nodes": {
                "fetch": {"result": "ok", "count": 3, "tags": ["a", "b"]}
            }
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn resolves_nested_path() {
        let out = resolve_variables("Hello {{input.name}}", &vars());
        assert_eq!(out, "Hello Ada");
    }

    #[test]
    fn resolves_through_node_namespace() {
        let out = resolve_variables("status={{nodes.fetch.result}}", &vars());
        assert_eq!(out, "status=ok");
    }

    #[test]
    fn leaves_unresolvable_path_verbatim() {
        let out = resolve_variables("{{nodes.missing.result}}", &vars());
        assert_eq!(out, "{{nodes.missing.result}}");
    }

    #[test]
    fn resolve_value_preserves_type() {
        let v = resolve_value("{{nodes.fetch.count}}", &vars());
        assert_eq!(v, json!(3));
        let v = resolve_value("{{nodes.fetch.tags}}", &vars());
        assert_eq!(v, json!(["a", "b"]));
    }

    #[test]
    fn resolve_json_recurses_into_objects_and_arrays() {
        let cfg = json!({
            "greeting": "hi {{input.name}}",
            "nested": {"score": "{{nodes.fetch.count}}"},
            "list": ["{{nodes.fetch.result}}", "literal"]
        });
        let resolved = resolve_json(&cfg, &vars());
        assert_eq!(resolved["greeting"], json!("hi Ada"));
        assert_eq!(resolved["nested"]["score"], json!(3));
        assert_eq!(resolved["list"][0], json!("ok"));
        assert_eq!(resolved["list"][1], json!("literal"));
    }

    #[test]
    fn resolve_json_array_elements_resolve_only_when_strings() {
        let cfg = json!({
            "list": [
                "{{nodes.fetch.result}}",
                {"nested": "{{input.name}}"},
                ["{{input.name}}"],
                3
            ]
        });
        let resolved = resolve_json(&cfg, &vars());
        assert_eq!(resolved["list"][0], json!("ok"));
        assert_eq!(resolved["list"][1], json!({"nested": "{{input.name}}"}));
        assert_eq!(resolved["list"][2], json!(["{{input.name}}"]));
        assert_eq!(resolved["list"][3], json!(3));
    }

    #[test]
    fn is_idempotent_on_already_resolved_text() {
        let once = resolve_variables("Hello {{input.name}}", &vars());
        let twice = resolve_variables(&once, &vars());
        assert_eq!(once, twice);
    }
}
