//! The narrow contract the `llm` node consumes.

use async_trait::async_trait;

use crate::error::ModelClientError;

/// One generation request. `stream` only controls how the client talks to
/// the backing service — callers always get the fully assembled text back.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            temperature: None,
            max_tokens: None,
            top_p: None,
            top_k: None,
        }
    }
}

/// Implemented by whatever backs the `llm` node — an HTTP-based service in
/// production, a canned responder in tests.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ModelClientError>;
}
