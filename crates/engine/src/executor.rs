//! Workflow execution engine.
//!
//! `WorkflowEngine` is the central orchestrator:
//! 1. Validates the DAG.
//! 2. Schedules nodes wave by wave — all nodes whose predecessors have
//!    completed are dispatched concurrently, and the engine waits for the
//!    whole wave before draining the next one.
//! 3. Aborts the run on the first node failure.
//! 4. Returns the named `output` node's value, or a map of every node's
//!    output if the workflow doesn't have one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tracing::{info, instrument};

use nodes::{ExecutionContext, NodeRegistry, RunControl};

use crate::dag::{adjacency_and_in_degree, validate_dag};
use crate::models::WorkflowDefinition;
use crate::EngineError;

/// How often the engine checks whether a paused run has been resumed.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Stateless orchestrator for a single workflow run. Construct one per
/// process and reuse it across executions — all per-run state lives in the
/// [`ExecutionContext`] passed to [`WorkflowEngine::run`].
pub struct WorkflowEngine {
    registry: Arc<NodeRegistry>,
}

impl WorkflowEngine {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self { registry }
    }

    /// Run `workflow` to completion against `ctx`, honoring `control`'s
    /// stop/pause flags at wave boundaries. Returns the terminal output on
    /// success.
    #[instrument(skip(self, workflow, ctx, control), fields(execution_id = %ctx.execution_id()))]
    pub async fn run(
        &self,
        workflow: &WorkflowDefinition,
        ctx: &ExecutionContext,
        control: &RunControl,
    ) -> Result<Value, EngineError> {
        validate_dag(workflow)?;

        let node_map: HashMap<&str, &crate::models::NodeDefinition> =
            workflow.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let (adjacency, mut in_degree) = adjacency_and_in_degree(workflow);

        let mut ready: Vec<String> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(id, _)| id.clone())
            .collect();

        if ready.is_empty() && !workflow.nodes.is_empty() {
            return Err(EngineError::NoStartNodes);
        }

        while !ready.is_empty() {
            if control.is_stopped() {
                return Err(EngineError::Stopped);
            }
            while control.is_paused() {
                if control.is_stopped() {
                    return Err(EngineError::Stopped);
                }
                tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
            }

            let wave = std::mem::take(&mut ready);
            info!(wave_size = wave.len(), nodes = ?wave, "dispatching wave");

            let dispatches = wave.iter().map(|node_id| {
                let node_def = node_map[node_id.as_str()];
                let node_id = node_id.clone();
                let node_type = node_def.node_type.clone();
                let config = node_def.config.clone();
                let registry = Arc::clone(&self.registry);
                let ctx = ctx.clone();

                async move {
                    let executor = registry
                        .create(&node_type)
                        .map_err(|_| EngineError::UnknownNodeType(node_type.clone()))?;
                    Ok::<_, EngineError>(executor.run(&node_id, &config, &ctx).await)
                }
            });

            let results = join_all(dispatches).await;

            for (node_id, outcome) in wave.iter().zip(results) {
                let result = outcome?;
                if result.is_success() {
                    if let Some(successors) = adjacency.get(node_id) {
                        for successor in successors {
                            let degree = in_degree.get_mut(successor).expect("successor is in in_degree map");
                            *degree -= 1;
                            if *degree == 0 {
                                ready.push(successor.clone());
                            }
                        }
                    }
                } else {
                    return Err(EngineError::NodeFailed {
                        node_id: node_id.clone(),
                        message: result.error.unwrap_or_default(),
                    });
                }
            }
        }

        Ok(terminal_output(workflow, ctx))
    }
}

fn terminal_output(workflow: &WorkflowDefinition, ctx: &ExecutionContext) -> Value {
    if let Some(output_node) = workflow.nodes.iter().find(|n| n.node_type == "output") {
        return ctx.get_node_output(&output_node.id).unwrap_or(Value::Null);
    }

    let outputs = ctx.node_outputs_snapshot();
    serde_json::to_value(outputs).unwrap_or(Value::Null)
}
