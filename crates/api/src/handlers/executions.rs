use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use nodes::LogLevel;

use crate::wire::FlowDefinition;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub execution_id: Uuid,
    pub workflow_id: Uuid,
    pub definition: FlowDefinition,
    #[serde(default)]
    pub input_data: Value,
}

#[derive(Debug, Serialize)]
pub struct ExecutionResponse {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub status: String,
    pub input_data: Value,
    pub output_data: Option<Value>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub async fn execute(State(state): State<AppState>, Json(req): Json<ExecuteRequest>) -> (StatusCode, Json<ExecutionResponse>) {
    let definition = req.definition.into();
    let record = state
        .manager
        .submit(req.execution_id, req.workflow_id, definition, req.input_data)
        .await;

    let body = ExecutionResponse {
        id: record.execution_id,
        workflow_id: record.workflow_id,
        status: record.status.to_string(),
        input_data: record.input_data,
        output_data: record.output_data,
        error_message: record.error_message,
        started_at: record.started_at,
        completed_at: record.completed_at,
    };
    (StatusCode::ACCEPTED, Json(body))
}

#[derive(Debug, Serialize)]
pub struct ExecutionStatusResponse {
    pub execution_id: Uuid,
    pub status: String,
    pub current_node: Option<String>,
    pub progress: f64,
    pub message: Option<String>,
}

pub async fn get_status(Path(execution_id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<ExecutionStatusResponse>, StatusCode> {
    let record = state.manager.get_status(execution_id).await.ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ExecutionStatusResponse {
        execution_id: record.execution_id,
        status: record.status.to_string(),
        current_node: record.current_node,
        progress: record.progress,
        message: record.error_message,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub level: Option<String>,
    pub limit: Option<usize>,
}

pub async fn get_logs(
    Path(execution_id): Path<Uuid>,
    Query(query): Query<LogsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>, StatusCode> {
    let level = match query.level.as_deref() {
        None => None,
        Some("debug") => Some(LogLevel::Debug),
        Some("info") => Some(LogLevel::Info),
        Some("warning") => Some(LogLevel::Warning),
        Some("error") => Some(LogLevel::Error),
        Some(_) => return Err(StatusCode::BAD_REQUEST),
    };

    let logs = state.manager.get_logs(execution_id, level, query.limit).await.ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(serde_json::json!({
        "execution_id": execution_id,
        "logs": logs,
        "count": logs.len(),
    })))
}

pub async fn stop(Path(execution_id): Path<Uuid>, State(state): State<AppState>) -> StatusCode {
    if state.manager.stop(execution_id).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn pause(Path(execution_id): Path<Uuid>, State(state): State<AppState>) -> StatusCode {
    if state.manager.pause(execution_id).await {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}

pub async fn resume(Path(execution_id): Path<Uuid>, State(state): State<AppState>) -> StatusCode {
    if state.manager.resume(execution_id).await {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}
