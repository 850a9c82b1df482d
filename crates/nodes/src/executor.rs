//! The `NodeExecutor` trait: every node type implements `validate` and
//! `execute`; the crate supplies the run template that wraps them.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{ExecutionContext, LogLevel};
use crate::error::NodeError;
use crate::resolver;
use crate::result::NodeResult;
use crate::status::NodeStatus;

/// A single typed step in a workflow.
///
/// Implementations provide `validate` and `execute`; `run` is a template
/// method that sequences validation, variable resolution, execution and
/// bookkeeping identically for every node type, so no node has to remember
/// to update its own status or record its own timing.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Stable discriminator used by the registry and in error messages
    /// (e.g. `"input"`, `"llm"`, `"condition"`).
    fn node_type(&self) -> &'static str;

    /// Reject a config this node type can't run before any node in the
    /// workflow executes. Called once, at workflow-validation time, with
    /// the *unresolved* config (placeholders are not yet known).
    fn validate(&self, config: &Value) -> Result<(), NodeError>;

    /// Do the node's work. `config` has already had every `{{...}}`
    /// placeholder resolved against the current context.
    async fn execute(&self, config: &Value, ctx: &ExecutionContext) -> Result<Value, NodeError>;

    /// Run this node against `node_id` end to end: resolve variables,
    /// execute, and record status/output/timing on `ctx`. Only the
    /// returned [`NodeResult`] and `ctx`'s bookkeeping are observable to
    /// callers — nodes never touch `ctx` status/logs directly.
    async fn run(&self, node_id: &str, config: &Value, ctx: &ExecutionContext) -> NodeResult {
        let started = Instant::now();
        ctx.set_node_status(node_id, NodeStatus::Running);
        ctx.add_log(
            LogLevel::Info,
            format!("node {node_id} ({}) started", self.node_type()),
            Some(node_id.to_string()),
            None,
        );

        if let Err(err) = self.validate(config) {
            let elapsed = started.elapsed();
            ctx.set_node_status(node_id, NodeStatus::Failed);
            ctx.add_log(
                LogLevel::Error,
                format!("node {node_id} failed validation: {err}"),
                Some(node_id.to_string()),
                None,
            );
            return NodeResult::failed(node_id, err.message(), elapsed);
        }

        let resolved = resolver::resolve_json(config, &ctx.variables_snapshot());

        let outcome = self.execute(&resolved, ctx).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(output) => {
                ctx.set_node_output(node_id, output.clone());
                ctx.set_node_status(node_id, NodeStatus::Success);
                ctx.add_log(
                    LogLevel::Info,
                    format!("node {node_id} succeeded in {:.3}s", elapsed.as_secs_f64()),
                    Some(node_id.to_string()),
                    None,
                );
                NodeResult::success(node_id, output, elapsed)
            }
            Err(err) => {
                ctx.set_node_status(node_id, NodeStatus::Failed);
                ctx.add_log(
                    LogLevel::Error,
                    format!("node {node_id} failed: {err}"),
                    Some(node_id.to_string()),
                    None,
                );
                NodeResult::failed(node_id, err.message(), elapsed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::NodeStatus;
    use serde_json::json;
    use uuid::Uuid;

    struct Echo;

    #[async_trait]
    impl NodeExecutor for Echo {
        fn node_type(&self) -> &'static str {
            "echo"
        }

        fn validate(&self, _config: &Value) -> Result<(), NodeError> {
            Ok(())
        }

        async fn execute(&self, config: &Value, _ctx: &ExecutionContext) -> Result<Value, NodeError> {
            Ok(config.clone())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl NodeExecutor for AlwaysFails {
        fn node_type(&self) -> &'static str {
            "fail"
        }

        fn validate(&self, _config: &Value) -> Result<(), NodeError> {
            Ok(())
        }

        async fn execute(&self, _config: &Value, _ctx: &ExecutionContext) -> Result<Value, NodeError> {
            Err(NodeError::execution("boom"))
        }
    }

    struct RejectsConfig;

    #[async_trait]
    impl NodeExecutor for RejectsConfig {
        fn node_type(&self) -> &'static str {
            "rejects"
        }

        fn validate(&self, _config: &Value) -> Result<(), NodeError> {
            Err(NodeError::validation("missing required field"))
        }

        async fn execute(&self, config: &Value, _ctx: &ExecutionContext) -> Result<Value, NodeError> {
            Ok(config.clone())
        }
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(Uuid::new_v4(), Uuid::new_v4(), json!({}), None)
    }

    #[tokio::test]
    async fn run_resolves_config_and_records_success() {
        let c = ctx();
        c.set_variable("input", json!({"name": "Ada"}));
        let result = Echo.run("n1", &json!({"greeting": "hi {{input.name}}"}), &c).await;

        assert!(result.is_success());
        assert_eq!(result.output.unwrap()["greeting"], json!("hi Ada"));
        assert_eq!(c.get_node_status("n1"), Some(NodeStatus::Success));
        assert_eq!(c.get_node_output("n1").unwrap()["greeting"], json!("hi Ada"));
    }

    #[tokio::test]
    async fn run_records_failure_without_panicking() {
        let c = ctx();
        let result = AlwaysFails.run("n1", &json!({}), &c).await;

        assert!(!result.is_success());
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert_eq!(c.get_node_status("n1"), Some(NodeStatus::Failed));
        assert_eq!(c.get_node_output("n1"), None);
    }

    #[tokio::test]
    async fn run_never_calls_execute_when_validation_fails() {
        let c = ctx();
        let result = RejectsConfig.run("n1", &json!({}), &c).await;

        assert!(!result.is_success());
        assert_eq!(result.error.as_deref(), Some("missing required field"));
        assert_eq!(c.get_node_status("n1"), Some(NodeStatus::Failed));
        assert_eq!(c.get_node_output("n1"), None);
    }
}
