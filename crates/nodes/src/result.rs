//! `NodeResult` — the value returned by every node's run template.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::status::NodeStatus;

/// Outcome of running a single node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    pub node_id: String,
    pub status: NodeStatus,
    pub output: Option<Value>,
    pub error: Option<String>,
    #[serde(with = "duration_secs")]
    pub execution_time: Duration,
}

impl NodeResult {
    pub fn success(node_id: impl Into<String>, output: Value, execution_time: Duration) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeStatus::Success,
            output: Some(output),
            error: None,
            execution_time,
        }
    }

    pub fn failed(node_id: impl Into<String>, error: impl Into<String>, execution_time: Duration) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeStatus::Failed,
            output: None,
            error: Some(error.into()),
            execution_time,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == NodeStatus::Success
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}
