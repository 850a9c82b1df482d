//! Node-level error type.

use thiserror::Error;

/// Errors returned by a node's `validate` or `execute` step.
///
/// The run template (see [`crate::executor::NodeExecutor::run`]) uses the
/// variant only to pick a log message — neither kind is retried; a node
/// failure always fails the whole run.
#[derive(Debug, Error, Clone)]
pub enum NodeError {
    /// Configuration rejected by `validate`.
    #[error("validation failed: {0}")]
    Validation(String),

    /// `execute` raised an error (including external failures such as a
    /// model-client error).
    #[error("execution failed: {0}")]
    Execution(String),
}

impl NodeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// The message without the variant's static prefix, for NodeResult::error.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(m) | Self::Execution(m) => m.clone(),
        }
    }
}
