//! The per-execution record the manager exposes to its callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use nodes::LogEntry;

use crate::status::RunStatus;

/// Snapshot of one execution's state. Cloned out of the manager's internal
/// map on every read — callers never see a lock guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: Uuid,
    pub workflow_id: Uuid,
    pub status: RunStatus,
    pub input_data: Value,
    pub output_data: Option<Value>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub current_node: Option<String>,
    pub progress: f64,
    pub logs: Vec<LogEntry>,
    #[serde(skip)]
    pub total_nodes: usize,
    #[serde(skip)]
    pub completed_nodes: usize,
}

impl ExecutionRecord {
    pub fn pending(execution_id: Uuid, workflow_id: Uuid, input_data: Value, total_nodes: usize) -> Self {
        Self {
            execution_id,
            workflow_id,
            status: RunStatus::Pending,
            input_data,
            output_data: None,
            error_message: None,
            started_at: None,
            completed_at: None,
            current_node: None,
            progress: 0.0,
            logs: Vec::new(),
            total_nodes,
            completed_nodes: 0,
        }
    }
}
