//! Maps a node's `type` string to the executor that knows how to run it.

use std::collections::HashMap;
use std::sync::Arc;

use model_client::ModelClient;

use crate::error::NodeError;
use crate::executor::NodeExecutor;
use crate::nodes::{
    condition::ConditionNode, input::InputNode, llm::LlmNode, output::OutputNode, transform::TransformNode,
};

type Factory = Box<dyn Fn() -> Arc<dyn NodeExecutor> + Send + Sync>;

/// Registry of known node types, keyed by the string used in workflow
/// definitions (`"input"`, `"llm"`, `"condition"`, `"transform"`,
/// `"output"`).
///
/// Unlike the executors it builds, a registry carries no per-node state —
/// one instance is shared across every run.
pub struct NodeRegistry {
    factories: HashMap<String, Factory>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(&mut self, node_type: impl Into<String>, factory: Factory) {
        self.factories.insert(node_type.into(), factory);
    }

    pub fn create(&self, node_type: &str) -> Result<Arc<dyn NodeExecutor>, NodeError> {
        self.factories
            .get(node_type)
            .map(|f| f())
            .ok_or_else(|| NodeError::validation(format!("unknown node type: {node_type}")))
    }

    pub fn has(&self, node_type: &str) -> bool {
        self.factories.contains_key(node_type)
    }

    /// Wire up the `llm` node type against a concrete model client. Not
    /// part of [`Default`] because, unlike the other four types, it needs
    /// a runtime dependency the registry can't manufacture on its own.
    pub fn register_llm(&mut self, client: Arc<dyn ModelClient>) {
        self.register(
            "llm",
            Box::new(move || Arc::new(LlmNode::new(client.clone())) as Arc<dyn NodeExecutor>),
        );
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("input", Box::new(|| Arc::new(InputNode)));
        registry.register("condition", Box::new(|| Arc::new(ConditionNode)));
        registry.register("transform", Box::new(|| Arc::new(TransformNode)));
        registry.register("output", Box::new(|| Arc::new(OutputNode)));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_knows_every_builtin_type() {
        let registry = NodeRegistry::default();
        for t in ["input", "condition", "transform", "output"] {
            assert!(registry.has(t), "missing builtin node type {t}");
        }
    }

    #[test]
    fn unknown_type_is_an_error() {
        let registry = NodeRegistry::default();
        assert!(registry.create("does-not-exist").is_err());
    }
}
