//! A configurable [`NodeExecutor`] test double, used by the engine crate's
//! scheduling tests so they don't depend on the real node types.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::executor::NodeExecutor;

/// Records every call it receives and returns a fixed outcome, optionally
/// after an artificial delay — useful for exercising wave barriers and
/// cancellation without real I/O.
pub struct MockNode {
    pub outcome: Result<Value, String>,
    pub delay: Duration,
    pub calls: Arc<Mutex<Vec<Value>>>,
}

impl MockNode {
    pub fn succeeding(output: Value) -> Self {
        Self {
            outcome: Ok(output),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl NodeExecutor for MockNode {
    fn node_type(&self) -> &'static str {
        "mock"
    }

    fn validate(&self, _config: &Value) -> Result<(), NodeError> {
        Ok(())
    }

    async fn execute(&self, config: &Value, _ctx: &ExecutionContext) -> Result<Value, NodeError> {
        self.calls.lock().await.push(config.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone().map_err(NodeError::execution)
    }
}

/// Counts executions across clones, for asserting wave concurrency without
/// inspecting timing.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
