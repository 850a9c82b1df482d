//! Per-execution context — the scratchpad every node reads and writes to.
//!
//! One [`ExecutionContext`] is created per run (by the manager) and shared,
//! by reference, across every node dispatched for that run. Nodes within a
//! wave write only under their own id, so a single lock per map is enough —
//! no per-key synchronization is needed.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::status::NodeStatus;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// A single append-only log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub execution_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub node_id: Option<String>,
    pub metadata: Option<Value>,
}

/// One-way event reported to whoever is observing a run.
///
/// Delivered over a bounded channel; the sender side never blocks or fails
/// the node that triggered it (a full or closed channel just drops the
/// event).
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    NodeStatus {
        execution_id: Uuid,
        node_id: String,
        status: NodeStatus,
    },
    Log(LogEntry),
}

/// Sending half of the observer channel, installed by the manager.
pub type ObserverHandle = mpsc::Sender<ExecutionEvent>;

fn emit(observer: &Option<ObserverHandle>, event: ExecutionEvent) {
    if let Some(tx) = observer {
        // try_send: never blocks, and a full/closed channel is not the
        // node's problem.
        let _ = tx.try_send(event);
    }
}

struct Inner {
    execution_id: Uuid,
    workflow_id: Uuid,
    input_data: Value,
    variables: RwLock<Map<String, Value>>,
    node_outputs: RwLock<HashMap<String, Value>>,
    node_order: Mutex<Vec<String>>,
    node_statuses: RwLock<HashMap<String, NodeStatus>>,
    logs: Mutex<Vec<LogEntry>>,
    started_at: RwLock<Option<DateTime<Utc>>>,
    completed_at: RwLock<Option<DateTime<Utc>>>,
    error: RwLock<Option<String>>,
    observer: Option<ObserverHandle>,
}

/// Per-run mutable state. Cheap to clone — every clone shares the
/// same underlying storage.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: std::sync::Arc<Inner>,
}

impl ExecutionContext {
    pub fn new(
        execution_id: Uuid,
        workflow_id: Uuid,
        input_data: Value,
        observer: Option<ObserverHandle>,
    ) -> Self {
        let mut variables = Map::new();
        variables.insert("input".to_string(), input_data.clone());
        variables.insert("nodes".to_string(), Value::Object(Map::new()));

        Self {
            inner: std::sync::Arc::new(Inner {
                execution_id,
                workflow_id,
                input_data,
                variables: RwLock::new(variables),
                node_outputs: RwLock::new(HashMap::new()),
                node_order: Mutex::new(Vec::new()),
                node_statuses: RwLock::new(HashMap::new()),
                logs: Mutex::new(Vec::new()),
                started_at: RwLock::new(None),
                completed_at: RwLock::new(None),
                error: RwLock::new(None),
                observer,
            }),
        }
    }

    pub fn execution_id(&self) -> Uuid {
        self.inner.execution_id
    }

    pub fn workflow_id(&self) -> Uuid {
        self.inner.workflow_id
    }

    pub fn input_data(&self) -> &Value {
        &self.inner.input_data
    }

    /// Snapshot of the variable namespace, for the resolver.
    pub fn variables_snapshot(&self) -> Map<String, Value> {
        self.inner.variables.read().unwrap().clone()
    }

    pub fn set_variable(&self, key: impl Into<String>, value: Value) {
        self.inner.variables.write().unwrap().insert(key.into(), value);
    }

    /// Record a node's output under `node_outputs` and as `nodes.<id>` in
    /// the variable namespace.
    pub fn set_node_output(&self, node_id: &str, output: Value) {
        self.inner
            .node_outputs
            .write()
            .unwrap()
            .insert(node_id.to_string(), output.clone());
        self.inner.node_order.lock().unwrap().push(node_id.to_string());

        let mut vars = self.inner.variables.write().unwrap();
        let nodes_entry = vars
            .entry("nodes".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(nodes_map) = nodes_entry {
            nodes_map.insert(node_id.to_string(), output);
        }
    }

    pub fn get_node_output(&self, node_id: &str) -> Option<Value> {
        self.inner.node_outputs.read().unwrap().get(node_id).cloned()
    }

    /// All node outputs, in insertion order (for the "last node" fallback
    /// in the output node and the "map of every node's output" terminal
    /// result).
    pub fn node_outputs_snapshot(&self) -> HashMap<String, Value> {
        self.inner.node_outputs.read().unwrap().clone()
    }

    /// Id of the node whose output was recorded most recently, in
    /// completion order (used by the output node when no explicit
    /// `source_node` is configured).
    pub fn last_completed_node_id(&self) -> Option<String> {
        self.inner.node_order.lock().unwrap().last().cloned()
    }

    pub fn set_node_status(&self, node_id: &str, status: NodeStatus) {
        self.inner
            .node_statuses
            .write()
            .unwrap()
            .insert(node_id.to_string(), status);

        emit(
            &self.inner.observer,
            ExecutionEvent::NodeStatus {
                execution_id: self.inner.execution_id,
                node_id: node_id.to_string(),
                status,
            },
        );
    }

    pub fn get_node_status(&self, node_id: &str) -> Option<NodeStatus> {
        self.inner.node_statuses.read().unwrap().get(node_id).copied()
    }

    pub fn node_statuses_snapshot(&self) -> HashMap<String, NodeStatus> {
        self.inner.node_statuses.read().unwrap().clone()
    }

    pub fn add_log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        node_id: Option<String>,
        metadata: Option<Value>,
    ) {
        let entry = LogEntry {
            execution_id: self.inner.execution_id,
            timestamp: Utc::now(),
            level,
            message: message.into(),
            node_id,
            metadata,
        };

        match level {
            LogLevel::Error => tracing::error!(execution_id = %entry.execution_id, node_id = ?entry.node_id, "{}", entry.message),
            LogLevel::Warning => tracing::warn!(execution_id = %entry.execution_id, node_id = ?entry.node_id, "{}", entry.message),
            LogLevel::Debug => tracing::debug!(execution_id = %entry.execution_id, node_id = ?entry.node_id, "{}", entry.message),
            LogLevel::Info => tracing::info!(execution_id = %entry.execution_id, node_id = ?entry.node_id, "{}", entry.message),
        }

        self.inner.logs.lock().unwrap().push(entry.clone());
        emit(&self.inner.observer, ExecutionEvent::Log(entry));
    }

    pub fn logs_snapshot(&self) -> Vec<LogEntry> {
        self.inner.logs.lock().unwrap().clone()
    }

    pub fn mark_started(&self) {
        *self.inner.started_at.write().unwrap() = Some(Utc::now());
    }

    pub fn mark_completed(&self, output: Value) {
        *self.inner.completed_at.write().unwrap() = Some(Utc::now());
        self.set_variable("output", output);
    }

    pub fn mark_failed(&self, error: impl Into<String>) {
        *self.inner.completed_at.write().unwrap() = Some(Utc::now());
        *self.inner.error.write().unwrap() = Some(error.into());
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.inner.started_at.read().unwrap()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        *self.inner.completed_at.read().unwrap()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.error.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(input: Value) -> ExecutionContext {
        ExecutionContext::new(Uuid::new_v4(), Uuid::new_v4(), input, None)
    }

    #[test]
    fn seeds_input_variable() {
        let c = ctx(json!({"a": 1}));
        let vars = c.variables_snapshot();
        assert_eq!(vars.get("input"), Some(&json!({"a": 1})));
    }

    #[test]
    fn node_output_mirrors_into_nodes_namespace() {
        let c = ctx(json!({}));
        c.set_node_output("n1", json!({"x": 42}));
        let vars = c.variables_snapshot();
        assert_eq!(vars["nodes"]["n1"]["x"], json!(42));
        assert_eq!(c.get_node_output("n1"), Some(json!({"x": 42})));
    }

    #[test]
    fn node_status_transitions_are_observable() {
        let c = ctx(json!({}));
        assert_eq!(c.get_node_status("n1"), None);
        c.set_node_status("n1", NodeStatus::Running);
        assert_eq!(c.get_node_status("n1"), Some(NodeStatus::Running));
        c.set_node_status("n1", NodeStatus::Success);
        assert_eq!(c.get_node_status("n1"), Some(NodeStatus::Success));
    }

    #[test]
    fn logs_are_appended_in_order() {
        let c = ctx(json!({}));
        c.add_log(LogLevel::Info, "first", None, None);
        c.add_log(LogLevel::Error, "second", Some("n1".into()), None);
        let logs = c.logs_snapshot();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "first");
        assert_eq!(logs[1].level, LogLevel::Error);
        assert!(logs[0].timestamp <= logs[1].timestamp);
    }
}
