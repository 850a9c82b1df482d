//! The JSON shape the HTTP layer accepts for a workflow definition — one
//! node per visual box, complete with the UI-only `position` and
//! `data.label` fields the engine never sees. Translated into
//! [`engine::WorkflowDefinition`] at the boundary so the core stays free of
//! anything the canvas needs but the scheduler doesn't.

use serde::Deserialize;
use serde_json::Value;

use engine::{Edge, NodeDefinition, WorkflowDefinition};

#[derive(Debug, Deserialize)]
pub struct FlowPosition {
    #[allow(dead_code)]
    pub x: f64,
    #[allow(dead_code)]
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub struct FlowNodeData {
    #[allow(dead_code)]
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Deserialize)]
pub struct FlowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[allow(dead_code)]
    #[serde(default)]
    pub position: Option<FlowPosition>,
    #[serde(default)]
    pub data: Option<FlowNodeData>,
}

#[derive(Debug, Deserialize)]
pub struct FlowEdge {
    #[allow(dead_code)]
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[allow(dead_code)]
    #[serde(default, rename = "sourceHandle")]
    pub source_handle: Option<String>,
    #[allow(dead_code)]
    #[serde(default, rename = "targetHandle")]
    pub target_handle: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FlowDefinition {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl From<FlowDefinition> for WorkflowDefinition {
    fn from(wire: FlowDefinition) -> Self {
        let nodes = wire
            .nodes
            .into_iter()
            .map(|n| NodeDefinition {
                id: n.id,
                node_type: n.node_type,
                config: n.data.map(|d| d.config).unwrap_or(Value::Null),
            })
            .collect();

        let edges = wire
            .edges
            .into_iter()
            .map(|e| Edge {
                source: e.source,
                target: e.target,
            })
            .collect();

        WorkflowDefinition::new(nodes, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn translates_flow_shape_into_the_minimal_engine_model() {
        let wire: FlowDefinition = serde_json::from_value(json!({
            "nodes": [
                {"id": "n1", "type": "input", "position": {"x": 0, "y": 0}, "data": {"label": "Start", "config": {"extract_field": "x"}}},
                {"id": "n2", "type": "output", "position": {"x": 100, "y": 0}, "data": {"label": "End"}},
            ],
            "edges": [
                {"id": "e1", "source": "n1", "target": "n2", "sourceHandle": "a"},
            ],
        }))
        .unwrap();

        let wf: WorkflowDefinition = wire.into();
        assert_eq!(wf.nodes.len(), 2);
        assert_eq!(wf.nodes[0].node_type, "input");
        assert_eq!(wf.nodes[0].config, json!({"extract_field": "x"}));
        assert_eq!(wf.nodes[1].config, Value::Null);
        assert_eq!(wf.edges.len(), 1);
        assert_eq!(wf.edges[0].source, "n1");
        assert_eq!(wf.edges[0].target, "n2");
    }
}
