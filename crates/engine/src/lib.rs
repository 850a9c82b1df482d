//! `engine` crate — workflow definition model, DAG validation, and the
//! wave-scheduling execution engine.

pub mod dag;
pub mod error;
pub mod executor;
pub mod models;

pub use dag::validate_dag;
pub use error::EngineError;
pub use executor::WorkflowEngine;
pub use models::{Edge, NodeDefinition, WorkflowDefinition};
