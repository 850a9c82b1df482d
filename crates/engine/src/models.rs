//! The static shape of a workflow: nodes and the edges between them.
//!
//! These types are the source of truth for what a workflow looks like in
//! memory. The HTTP layer translates the wire format (with UI-only fields
//! like node `position`) into this minimal shape at the boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single step in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Unique identifier within this workflow (referenced by edges).
    pub id: String,
    /// Maps to a registered node executor (`input`, `llm`, `condition`,
    /// `transform`, `output`).
    pub node_type: String,
    /// Arbitrary configuration passed to the node at execution time.
    pub config: Value,
}

/// Directed edge from one node to another. Self-loops and duplicate edges
/// are tolerated; cycles are rejected at validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

/// An immutable workflow definition: an ordered list of nodes and edges.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkflowDefinition {
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<Edge>,
}

impl WorkflowDefinition {
    pub fn new(nodes: Vec<NodeDefinition>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }
}
