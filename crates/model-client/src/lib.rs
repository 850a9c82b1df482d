//! The model-client interface consumed by the `llm` node, plus a concrete
//! Ollama-compatible implementation.

mod client;
mod error;
mod ollama;

pub use client::{GenerateRequest, ModelClient};
pub use error::ModelClientError;
pub use ollama::OllamaClient;
