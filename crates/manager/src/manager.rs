//! `ExecutionManager` — owns the per-execution records and drives each run
//! as a background task, mirroring the context's observer events into the
//! record a caller can poll.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, RwLock as AsyncRwLock};
use tracing::instrument;
use uuid::Uuid;

use engine::{WorkflowDefinition, WorkflowEngine};
use nodes::{ExecutionContext, ExecutionEvent, LogLevel, NodeStatus, RunControl};

use crate::record::ExecutionRecord;
use crate::status::RunStatus;

/// Capacity of the observer channel installed into every run's context.
/// Events are dropped past this, never blocking the node that emitted them.
const OBSERVER_CHANNEL_CAPACITY: usize = 1024;

struct RunHandle {
    control: RunControl,
    task: tokio::task::JoinHandle<()>,
}

struct Inner {
    records: AsyncRwLock<HashMap<Uuid, ExecutionRecord>>,
    handles: AsyncRwLock<HashMap<Uuid, RunHandle>>,
}

/// Coordinates workflow runs. Cheap to clone — share one instance across an
/// HTTP server's handlers.
#[derive(Clone)]
pub struct ExecutionManager {
    engine: Arc<WorkflowEngine>,
    inner: Arc<Inner>,
}

impl ExecutionManager {
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        Self {
            engine,
            inner: Arc::new(Inner {
                records: AsyncRwLock::new(HashMap::new()),
                handles: AsyncRwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a `pending` record and spawn the background task that drives
    /// the run to completion. Always succeeds from the caller's point of
    /// view — a malformed definition surfaces as a `failed` record, not an
    /// error returned here.
    #[instrument(skip(self, definition, input_data), fields(execution_id = %execution_id))]
    pub async fn submit(
        &self,
        execution_id: Uuid,
        workflow_id: Uuid,
        definition: WorkflowDefinition,
        input_data: Value,
    ) -> ExecutionRecord {
        let record = ExecutionRecord::pending(execution_id, workflow_id, input_data.clone(), definition.nodes.len());
        self.inner.records.write().await.insert(execution_id, record.clone());

        let (tx, rx) = mpsc::channel(OBSERVER_CHANNEL_CAPACITY);
        let ctx = ExecutionContext::new(execution_id, workflow_id, input_data, Some(tx));
        let control = RunControl::new();

        let records = Arc::clone(&self.inner);
        tokio::spawn(drain_events(Arc::clone(&records), execution_id, rx));

        let engine = Arc::clone(&self.engine);
        let run_ctx = ctx.clone();
        let run_control = control.clone();
        let records_for_task = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            {
                let mut records = records_for_task.records.write().await;
                if let Some(r) = records.get_mut(&execution_id) {
                    r.status = RunStatus::Running;
                    r.started_at = Some(chrono::Utc::now());
                }
            }

            let outcome = engine.run(&definition, &run_ctx, &run_control).await;

            let mut records = records_for_task.records.write().await;
            if let Some(r) = records.get_mut(&execution_id) {
                r.completed_at = Some(chrono::Utc::now());
                match outcome {
                    Ok(output) => {
                        r.status = RunStatus::Completed;
                        r.output_data = Some(output);
                        r.progress = 1.0;
                    }
                    Err(engine::EngineError::Stopped) => {
                        r.status = RunStatus::Stopped;
                    }
                    Err(err) => {
                        r.status = RunStatus::Failed;
                        r.error_message = Some(err.to_string());
                    }
                }
            }
        });

        self.inner
            .handles
            .write()
            .await
            .insert(execution_id, RunHandle { control, task });

        record
    }

    pub async fn get_status(&self, execution_id: Uuid) -> Option<ExecutionRecord> {
        self.inner.records.read().await.get(&execution_id).cloned()
    }

    /// Logs for a run, optionally filtered by minimum level and tail-limited
    /// to the most recent `limit` entries.
    pub async fn get_logs(&self, execution_id: Uuid, level: Option<LogLevel>, limit: Option<usize>) -> Option<Vec<nodes::LogEntry>> {
        let records = self.inner.records.read().await;
        let record = records.get(&execution_id)?;

        let mut logs: Vec<nodes::LogEntry> = match level {
            Some(level) => record.logs.iter().filter(|l| l.level == level).cloned().collect(),
            None => record.logs.clone(),
        };

        if let Some(limit) = limit {
            if logs.len() > limit {
                logs = logs.split_off(logs.len() - limit);
            }
        }

        Some(logs)
    }

    /// Idempotent; returns `false` if the execution is unknown.
    pub async fn stop(&self, execution_id: Uuid) -> bool {
        let handle = self.inner.handles.read().await.get(&execution_id).map(|h| h.control.clone());
        let Some(control) = handle else {
            return false;
        };
        control.stop();

        let task = self.inner.handles.write().await.remove(&execution_id).map(|h| h.task);
        if let Some(task) = task {
            let _ = task.await;
        }

        let mut records = self.inner.records.write().await;
        if let Some(r) = records.get_mut(&execution_id) {
            if !r.status.is_terminal() {
                r.status = RunStatus::Stopped;
                r.completed_at.get_or_insert_with(chrono::Utc::now);
            }
        }
        true
    }

    /// Only valid from `running`.
    pub async fn pause(&self, execution_id: Uuid) -> bool {
        let mut records = self.inner.records.write().await;
        let Some(record) = records.get_mut(&execution_id) else {
            return false;
        };
        if record.status != RunStatus::Running {
            return false;
        }
        let handles = self.inner.handles.read().await;
        let Some(handle) = handles.get(&execution_id) else {
            return false;
        };
        handle.control.pause();
        record.status = RunStatus::Paused;
        true
    }

    /// Only valid from `paused`.
    pub async fn resume(&self, execution_id: Uuid) -> bool {
        let mut records = self.inner.records.write().await;
        let Some(record) = records.get_mut(&execution_id) else {
            return false;
        };
        if record.status != RunStatus::Paused {
            return false;
        }
        let handles = self.inner.handles.read().await;
        let Some(handle) = handles.get(&execution_id) else {
            return false;
        };
        handle.control.resume();
        record.status = RunStatus::Running;
        true
    }
}

/// Drains a run's observer channel, mirroring node-status and log events
/// into its record. Ends naturally once the context (and its sender) is
/// dropped at the end of the run.
async fn drain_events(inner: Arc<Inner>, execution_id: Uuid, mut rx: mpsc::Receiver<ExecutionEvent>) {
    while let Some(event) = rx.recv().await {
        let mut records = inner.records.write().await;
        let Some(record) = records.get_mut(&execution_id) else {
            continue;
        };

        match event {
            ExecutionEvent::NodeStatus { node_id, status, .. } => {
                if status == NodeStatus::Running {
                    record.current_node = Some(node_id);
                } else if matches!(status, NodeStatus::Success | NodeStatus::Failed | NodeStatus::Skipped) {
                    record.completed_nodes += 1;
                    if record.total_nodes > 0 {
                        record.progress = record.completed_nodes as f64 / record.total_nodes as f64;
                    }
                }
            }
            ExecutionEvent::Log(entry) => record.logs.push(entry),
        }
    }
}
