//! Error taxonomy a model client may surface to the `llm` node.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ModelClientError {
    #[error("could not connect to model service: {0}")]
    Connection(String),

    #[error("model '{0}' not found")]
    ModelNotFound(String),

    #[error("model service error: {0}")]
    Service(String),

    #[error("model service timed out after {0:?}")]
    Timeout(std::time::Duration),
}
