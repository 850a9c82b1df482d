//! The `llm` node: resolves a prompt template and calls an external model.

use std::sync::Arc;

use async_trait::async_trait;
use model_client::{GenerateRequest, ModelClient};
use serde_json::{json, Value};

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::executor::NodeExecutor;

pub struct LlmNode {
    client: Arc<dyn ModelClient>,
}

impl LlmNode {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NodeExecutor for LlmNode {
    fn node_type(&self) -> &'static str {
        "llm"
    }

    fn validate(&self, config: &Value) -> Result<(), NodeError> {
        if !config.get("model").is_some_and(Value::is_string) {
            return Err(NodeError::validation("llm.model is required"));
        }
        if !config.get("prompt").is_some_and(Value::is_string) {
            return Err(NodeError::validation("llm.prompt is required"));
        }
        if let Some(t) = config.get("temperature") {
            let t = t.as_f64().ok_or_else(|| NodeError::validation("llm.temperature must be a number"))?;
            if !(0.0..=2.0).contains(&t) {
                return Err(NodeError::validation("llm.temperature must be within [0, 2]"));
            }
        }
        if let Some(mt) = config.get("max_tokens") {
            let mt = mt.as_i64().ok_or_else(|| NodeError::validation("llm.max_tokens must be an integer"))?;
            if mt <= 0 {
                return Err(NodeError::validation("llm.max_tokens must be positive"));
            }
        }
        if let Some(tp) = config.get("top_p") {
            if !tp.is_number() {
                return Err(NodeError::validation("llm.top_p must be a number"));
            }
        }
        if let Some(tk) = config.get("top_k") {
            if !tk.is_number() {
                return Err(NodeError::validation("llm.top_k must be a number"));
            }
        }
        Ok(())
    }

    async fn execute(&self, config: &Value, _ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let model = config["model"].as_str().unwrap_or_default().to_string();
        let prompt = config["prompt"].as_str().unwrap_or_default().to_string();

        let mut request = GenerateRequest::new(model.clone(), prompt);
        request.stream = config.get("stream").and_then(Value::as_bool).unwrap_or(false);
        request.temperature = config.get("temperature").and_then(Value::as_f64).map(|v| v as f32);
        request.max_tokens = config.get("max_tokens").and_then(Value::as_u64).map(|v| v as u32);
        request.top_p = config.get("top_p").and_then(Value::as_f64).map(|v| v as f32);
        request.top_k = config.get("top_k").and_then(Value::as_u64).map(|v| v as u32);

        let response = self
            .client
            .generate(request)
            .await
            .map_err(|e| NodeError::execution(e.to_string()))?;

        Ok(json!({"response": response, "model": model}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_client::ModelClientError;
    use serde_json::json;
    use uuid::Uuid;

    struct Canned(&'static str);

    #[async_trait]
    impl ModelClient for Canned {
        async fn generate(&self, _request: GenerateRequest) -> Result<String, ModelClientError> {
            Ok(self.0.to_string())
        }
    }

    struct AlwaysErrors;

    #[async_trait]
    impl ModelClient for AlwaysErrors {
        async fn generate(&self, _request: GenerateRequest) -> Result<String, ModelClientError> {
            Err(ModelClientError::Service("down".to_string()))
        }
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(Uuid::new_v4(), Uuid::new_v4(), json!({}), None)
    }

    #[tokio::test]
    async fn execute_returns_the_generated_text() {
        let node = LlmNode::new(Arc::new(Canned("hello there")));
        let config = json!({"model": "llama3", "prompt": "say hi"});
        let out = node.execute(&config, &ctx()).await.unwrap();
        assert_eq!(out["response"], json!("hello there"));
        assert_eq!(out["model"], json!("llama3"));
    }

    #[tokio::test]
    async fn execute_wraps_model_errors_as_node_errors() {
        let node = LlmNode::new(Arc::new(AlwaysErrors));
        let config = json!({"model": "llama3", "prompt": "say hi"});
        assert!(node.execute(&config, &ctx()).await.is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_temperature() {
        let node = LlmNode::new(Arc::new(Canned("")));
        let config = json!({"model": "m", "prompt": "p", "temperature": 5.0});
        assert!(node.validate(&config).is_err());
    }

    #[test]
    fn validate_requires_model_and_prompt() {
        let node = LlmNode::new(Arc::new(Canned("")));
        assert!(node.validate(&json!({})).is_err());
        assert!(node.validate(&json!({"model": "m"})).is_err());
    }
}
