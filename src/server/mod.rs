//! HTTP entrypoint.
//!
//! Serves:
//! - `POST /invocations` → orchestrator payload in, `{"result"}` / `{"error"}` out
//! - `GET /ping` → `{"status":"Healthy"}`
//!
//! When the payload has no `session_id`, the runtime session header is used
//! before the configured default.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::warn;

use crate::agents::transport::SESSION_ID_HEADER;
use crate::error::Result;
use crate::orchestrator::{InvokePayload, InvokeResponse, Orchestrator};

/// Build the entrypoint router around a shared orchestrator.
pub fn create_app(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/invocations", post(invocations))
        .route("/ping", get(ping))
        .with_state(orchestrator)
}

/// Bind `host:port` and serve until Ctrl-C.
pub async fn serve(orchestrator: Arc<Orchestrator>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    crate::log_component!(info, "server", "Entrypoint listening", addr = addr.as_str());

    axum::serve(listener, create_app(orchestrator))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            crate::log_component!(info, "server", "Shutting down entrypoint");
        })
        .await?;
    Ok(())
}

async fn ping() -> impl IntoResponse {
    Json(json!({"status": "Healthy"}))
}

async fn invocations(
    State(orchestrator): State<Arc<Orchestrator>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let mut payload: InvokePayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejected invocation with malformed JSON");
            return (
                StatusCode::BAD_REQUEST,
                Json(InvokeResponse::Error {
                    error: format!("Invalid JSON payload: {}", e),
                }),
            );
        }
    };

    if payload.session_id.is_none() {
        payload.session_id = headers
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
    }

    (StatusCode::OK, Json(orchestrator.invoke(payload).await))
}
