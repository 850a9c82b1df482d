//! Engine-level error types.

use thiserror::Error;

/// Errors produced by the workflow engine (validation + scheduling).
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// An edge references a node ID that doesn't exist in the workflow.
    #[error("edge references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference { node_id: String, side: &'static str },

    /// The graph contains a circular reference.
    #[error("workflow graph contains a circular reference")]
    CycleDetected,

    /// A non-empty graph has no zero-in-degree node to start from.
    #[error("workflow has no start nodes")]
    NoStartNodes,

    /// No factory is registered for a node's `node_type`.
    #[error("no executor registered for node type '{0}'")]
    UnknownNodeType(String),

    /// A node's run template returned a failed result; the whole run
    /// aborts on the first one.
    #[error("node '{node_id}' failed: {message}")]
    NodeFailed { node_id: String, message: String },

    /// The run was stopped before completing.
    #[error("execution was stopped")]
    Stopped,
}
