// Knoux HTTP Server
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::health::{self, SubsystemStatus};
use crate::state::SharedState;
use crate::{ai_api, project_api};

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/api/demo", get(demo))
        .route("/api/health", get(health_check))
        .nest("/api/ai-models", ai_api::router())
        .nest("/api/projects", project_api::router())
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
}

/// Serves until Ctrl-C, then stops the watchdog.
pub async fn start_server(port: u16, state: SharedState) -> anyhow::Result<()> {
    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 Knoux server running on http://127.0.0.1:{}", port);

    state.monitor.start();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    state.monitor.stop();

    info!("[SERVER] Shut down cleanly\n{}", state.monitor.status_report());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[SERVER] Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("[SERVER] Ctrl-C received, draining connections");
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    debug!(
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "[HTTP] {} {}",
        method,
        path
    );
    response
}

async fn ping() -> Json<serde_json::Value> {
    // Literal kept for existing editor builds that match on it.
    Json(json!({ "message": "Hello from Express server v2!" }))
}

async fn demo() -> Json<serde_json::Value> {
    Json(json!({ "message": "Hello from the Knoux server" }))
}

async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let report = health::check_dependencies(&state.config, state.models.runner(), state.monitor.uptime_secs()).await;
    let status = match report.overall {
        SubsystemStatus::Down(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (status, Json(report))
}
