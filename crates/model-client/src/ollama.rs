//! An Ollama-compatible HTTP implementation of [`ModelClient`].

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::{GenerateRequest, ModelClient};
use crate::error::ModelClientError;

const MAX_ATTEMPTS: u32 = 3;

pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, max_connections: usize) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(max_connections)
            .build()
            .expect("reqwest client configuration is valid");

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn generate_once(&self, request: &GenerateRequest) -> Result<String, ModelClientError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let mut options = serde_json::Map::new();
        if let Some(t) = request.temperature {
            options.insert("temperature".to_string(), json!(t));
        }
        if let Some(mt) = request.max_tokens {
            options.insert("num_predict".to_string(), json!(mt));
        }
        if let Some(p) = request.top_p {
            options.insert("top_p".to_string(), json!(p));
        }
        if let Some(k) = request.top_k {
            options.insert("top_k".to_string(), json!(k));
        }

        let body = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": request.stream,
            "options": options,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ModelClientError::ModelNotFound(request.model.clone()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ModelClientError::Service(format!("{status}: {text}")));
        }

        if request.stream {
            let mut stream = response.bytes_stream();
            let mut text = String::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(map_reqwest_error)?;
                for line in chunk.split(|b| *b == b'\n') {
                    if line.is_empty() {
                        continue;
                    }
                    if let Ok(parsed) = serde_json::from_slice::<OllamaChunk>(line) {
                        text.push_str(&parsed.response);
                    }
                }
            }
            Ok(text)
        } else {
            let parsed: OllamaChunk = response.json().await.map_err(map_reqwest_error)?;
            Ok(parsed.response)
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ModelClientError> {
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.generate_once(&request).await {
                Ok(text) => return Ok(text),
                Err(err @ ModelClientError::ModelNotFound(_)) => return Err(err),
                Err(err @ (ModelClientError::Connection(_) | ModelClientError::Timeout(_))) => {
                    last_err = Some(err);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(Duration::from_millis(200 * attempt as u64)).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.expect("loop always sets last_err before exhausting attempts"))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ModelClientError {
    if err.is_timeout() {
        ModelClientError::Timeout(Duration::from_secs(0))
    } else if err.is_connect() {
        ModelClientError::Connection(err.to_string())
    } else {
        ModelClientError::Service(err.to_string())
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct OllamaChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_configured_timeout() {
        let client = OllamaClient::new("http://localhost:11434", Duration::from_secs(30), 8);
        assert_eq!(client.base_url, "http://localhost:11434");
    }
}
