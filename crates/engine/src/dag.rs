//! DAG validation and the adjacency structures the scheduler runs against.
//!
//! Rules enforced:
//! 1. Node IDs must be unique within the workflow.
//! 2. Every edge must reference valid node IDs (both `source` and `target`).
//! 3. The directed graph must be acyclic (topological sort must succeed).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{models::WorkflowDefinition, EngineError};

/// Validate the workflow's DAG and return nodes in topological execution
/// order. Kept for tests and callers that only need the order, not the
/// adjacency structure the scheduler uses internally.
pub fn validate_dag(workflow: &WorkflowDefinition) -> Result<Vec<String>, EngineError> {
    check_unique_ids_and_edges(workflow)?;

    let (adjacency, mut in_degree) = adjacency_and_in_degree(workflow);

    let mut queue: VecDeque<String> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(id, _)| id.clone())
        .collect();

    let mut sorted: Vec<String> = Vec::with_capacity(workflow.nodes.len());

    while let Some(node_id) = queue.pop_front() {
        sorted.push(node_id.clone());

        if let Some(neighbours) = adjacency.get(&node_id) {
            for neighbour in neighbours {
                let deg = in_degree.entry(neighbour.clone()).or_insert(0);
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(neighbour.clone());
                }
            }
        }
    }

    if sorted.len() != workflow.nodes.len() {
        return Err(EngineError::CycleDetected);
    }

    Ok(sorted)
}

fn check_unique_ids_and_edges(workflow: &WorkflowDefinition) -> Result<(), EngineError> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &workflow.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            return Err(EngineError::DuplicateNodeId(node.id.clone()));
        }
    }

    let node_set: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in &workflow.edges {
        if !node_set.contains(edge.source.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.source.clone(),
                side: "source",
            });
        }
        if !node_set.contains(edge.target.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.target.clone(),
                side: "target",
            });
        }
    }

    Ok(())
}

/// Build owned adjacency and in-degree maps for the scheduler to mutate
/// wave by wave. Assumes the workflow already passed
/// [`check_unique_ids_and_edges`] (the scheduler calls `validate_dag`
/// first).
pub fn adjacency_and_in_degree(
    workflow: &WorkflowDefinition,
) -> (HashMap<String, Vec<String>>, HashMap<String, usize>) {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut in_degree: HashMap<String, usize> = HashMap::new();

    for node in &workflow.nodes {
        adjacency.entry(node.id.clone()).or_default();
        in_degree.entry(node.id.clone()).or_insert(0);
    }

    for edge in &workflow.edges {
        adjacency.entry(edge.source.clone()).or_default().push(edge.target.clone());
        *in_degree.entry(edge.target.clone()).or_insert(0) += 1;
    }

    (adjacency, in_degree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edge, NodeDefinition};

    fn make_node(id: &str) -> NodeDefinition {
        NodeDefinition {
            id: id.to_string(),
            node_type: "mock".into(),
            config: serde_json::Value::Null,
        }
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            source: source.into(),
            target: target.into(),
        }
    }

    fn workflow(nodes: Vec<NodeDefinition>, edges: Vec<Edge>) -> WorkflowDefinition {
        WorkflowDefinition::new(nodes, edges)
    }

    #[test]
    fn valid_linear_dag_returns_sorted_order() {
        let wf = workflow(
            vec![make_node("a"), make_node("b"), make_node("c")],
            vec![edge("a", "b"), edge("b", "c")],
        );
        let sorted = validate_dag(&wf).expect("should be valid");
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn valid_diamond_dag() {
        let wf = workflow(
            vec![make_node("a"), make_node("b"), make_node("c"), make_node("d")],
            vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")],
        );
        let sorted = validate_dag(&wf).expect("should be valid");
        assert_eq!(sorted.first().unwrap(), "a");
        assert_eq!(sorted.last().unwrap(), "d");
        assert_eq!(sorted.len(), 4);
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let wf = workflow(vec![make_node("a"), make_node("a")], vec![]);
        assert!(matches!(
            validate_dag(&wf),
            Err(EngineError::DuplicateNodeId(id)) if id == "a"
        ));
    }

    #[test]
    fn edge_referencing_missing_node_is_rejected() {
        let wf = workflow(vec![make_node("a")], vec![edge("a", "ghost")]);
        assert!(matches!(
            validate_dag(&wf),
            Err(EngineError::UnknownNodeReference { node_id, .. }) if node_id == "ghost"
        ));
    }

    #[test]
    fn cycle_is_detected() {
        let wf = workflow(
            vec![make_node("a"), make_node("b"), make_node("c")],
            vec![edge("a", "b"), edge("b", "c"), edge("c", "a")],
        );
        assert!(matches!(validate_dag(&wf), Err(EngineError::CycleDetected)));
    }

    #[test]
    fn single_node_no_edges_is_valid() {
        let wf = workflow(vec![make_node("solo")], vec![]);
        let sorted = validate_dag(&wf).expect("single node should be valid");
        assert_eq!(sorted, vec!["solo"]);
    }

    #[test]
    fn self_loop_does_not_break_validation() {
        let wf = workflow(vec![make_node("solo")], vec![edge("solo", "solo")]);
        assert!(matches!(validate_dag(&wf), Err(EngineError::CycleDetected)));
    }
}
