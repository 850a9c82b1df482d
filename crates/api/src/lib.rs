//! `api` crate — HTTP surface over the execution manager.
//!
//! Exposes:
//!   POST /api/v1/execute
//!   GET  /api/v1/execute/:id/status
//!   GET  /api/v1/execute/:id/logs
//!   POST /api/v1/execute/:id/stop
//!   POST /api/v1/execute/:id/pause
//!   POST /api/v1/execute/:id/resume
//!   GET  /health
//!   GET  /

pub mod handlers;
pub mod wire;

use axum::{
    routing::{get, post},
    Router,
};
use manager::ExecutionManager;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub manager: ExecutionManager,
}

pub async fn serve(bind: &str, manager: ExecutionManager) -> Result<(), std::io::Error> {
    let state = AppState { manager };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .route("/execute", post(handlers::executions::execute))
        .route("/execute/:id/status", get(handlers::executions::get_status))
        .route("/execute/:id/logs", get(handlers::executions::get_logs))
        .route("/execute/:id/stop", post(handlers::executions::stop))
        .route("/execute/:id/pause", post(handlers::executions::pause))
        .route("/execute/:id/resume", post(handlers::executions::resume));

    let app = Router::new()
        .nest("/api/v1", api_router)
        .route("/health", get(handlers::system::health))
        .route("/", get(handlers::system::banner))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}
